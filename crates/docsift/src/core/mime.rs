//! MIME type normalization and URL extension helpers.
//!
//! Crawled documents arrive with whatever `Content-Type` the server sent, so
//! MIME strings are normalized before lookup and the URL path extension is
//! used when the declared type is missing or generic.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use url::Url;

pub const HTML_MIME_TYPE: &str = "text/html";
pub const XHTML_MIME_TYPE: &str = "application/xhtml+xml";
pub const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";
pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const DOCX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const POWER_POINT_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const EXCEL_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const EPUB_MIME_TYPE: &str = "application/epub+zip";
pub const XML_MIME_TYPE: &str = "application/xml";
pub const XML_TEXT_MIME_TYPE: &str = "text/xml";
pub const SVG_MIME_TYPE: &str = "image/svg+xml";
pub const BMP_MIME_TYPE: &str = "image/bmp";
pub const JPEG_MIME_TYPE: &str = "image/jpeg";
pub const RSS_MIME_TYPE: &str = "application/rss+xml";
pub const ATOM_MIME_TYPE: &str = "application/atom+xml";
pub const RDF_MIME_TYPE: &str = "application/rdf+xml";
pub const SITEMAP_MIME_TYPE: &str = "application/x-sitemap+xml";
pub const GOPHER_MIME_TYPE: &str = "application/gopher-menu";
pub const OCTET_STREAM_MIME_TYPE: &str = "application/octet-stream";

/// Extensions whose registered MIME type differs from what `mime_guess` reports.
static EXT_TO_MIME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("txt", PLAIN_TEXT_MIME_TYPE);
    m.insert("html", HTML_MIME_TYPE);
    m.insert("htm", HTML_MIME_TYPE);
    m.insert("xhtml", XHTML_MIME_TYPE);
    m.insert("pdf", PDF_MIME_TYPE);
    m.insert("docx", DOCX_MIME_TYPE);
    m.insert("pptx", POWER_POINT_MIME_TYPE);
    m.insert("xlsx", EXCEL_MIME_TYPE);
    m.insert("epub", EPUB_MIME_TYPE);
    m.insert("xml", XML_MIME_TYPE);
    m.insert("svg", SVG_MIME_TYPE);
    m.insert("bmp", BMP_MIME_TYPE);
    m.insert("jpg", JPEG_MIME_TYPE);
    m.insert("jpeg", JPEG_MIME_TYPE);
    m.insert("rss", RSS_MIME_TYPE);
    m.insert("atom", ATOM_MIME_TYPE);
    m.insert("rdf", RDF_MIME_TYPE);

    m
});

/// Lower-case a MIME type and strip parameters such as `; charset=utf-8`.
pub fn normalize_mime_type(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// MIME types that carry no format information and need root-element sniffing.
pub fn is_generic_xml(mime_type: &str) -> bool {
    mime_type == XML_MIME_TYPE || mime_type == XML_TEXT_MIME_TYPE
}

/// Last path segment of the URL, or the host when the path is empty.
pub fn filename_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Lower-cased file extension of the URL path, if any.
pub fn extension_from_url(url: &Url) -> Option<String> {
    let filename = filename_from_url(url);
    if url.path_segments().and_then(|mut s| s.next_back()).is_none_or(|s| s.is_empty()) {
        return None;
    }
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 8 {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Best-guess MIME type for an extension.
pub fn mime_from_extension(extension: &str) -> Option<String> {
    let extension = extension.to_ascii_lowercase();
    EXT_TO_MIME
        .get(extension.as_str())
        .map(|mime| mime.to_string())
        .or_else(|| mime_guess::from_ext(&extension).first().map(|mime| mime.essence_str().to_string()))
}
