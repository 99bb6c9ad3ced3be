//! Image extractors: BMP, raster formats decoded by `image`, and SVG.
//!
//! Images carry no indexable text beyond their file name, so every image
//! summary has `"Image of <filename>"` as description, an HTML page with the
//! original bytes inlined as body, and a square thumbnail.

use crate::core::context::ExtractionContext;
use crate::core::mime::{BMP_MIME_TYPE, JPEG_MIME_TYPE, SVG_MIME_TYPE, filename_from_url};
use crate::error::Result;
use crate::extraction::bmp::decode_bmp;
use crate::extraction::image::{decode_raster, generate_thumbnail, image_html_wrapper};
use crate::extraction::xml::{decode_xml, node_text, parse_document};
use crate::plugins::{DocumentExtractor, Plugin};
use crate::text::string_utils::{escape_html, push_capped, truncate_chars};
use crate::types::{EncodedImage, RenderedContent, Summary};
use image::DynamicImage;
use url::Url;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Summary shared by all image formats.
fn image_summary(content: &[u8], url: &Url, ctx: &ExtractionContext, mime_type: &str) -> Summary {
    let filename = filename_from_url(url);
    let body = RenderedContent::html(image_html_wrapper(content, mime_type, &filename));
    let mut summary = Summary::new(url, mime_type, body);
    summary.description = truncate_chars(&format!("Image of {filename}"), ctx.config().max_description_len);
    summary
}

fn thumbnail_for(image: Option<&DynamicImage>, ctx: &ExtractionContext) -> Option<EncodedImage> {
    match generate_thumbnail(image, ctx.config().thumbnail_dimension) {
        Ok(thumbnail) => Some(thumbnail),
        Err(e) => {
            tracing::debug!(error = %e, "Thumbnail generation failed");
            None
        }
    }
}

/// Uncompressed 24/32-bit BMP images.
pub struct BmpExtractor;

impl BmpExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BmpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for BmpExtractor {
    fn name(&self) -> &str {
        "bmp-extractor"
    }

    fn description(&self) -> &str {
        "Decodes BMP images into thumbnails"
    }
}

impl DocumentExtractor for BmpExtractor {
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
        let framebuffer = decode_bmp(content, ctx.config().max_image_dimension);
        let decoded = (framebuffer.width() > 0).then(|| DynamicImage::ImageRgb8(framebuffer));

        let mut summary = image_summary(content, url, ctx, BMP_MIME_TYPE);
        summary.thumbnail = thumbnail_for(decoded.as_ref(), ctx);
        Ok(summary)
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[BMP_MIME_TYPE, "image/x-bmp", "image/x-ms-bmp"]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["bmp"]
    }

    fn is_image_format(&self) -> bool {
        true
    }
}

/// JPEG, PNG and GIF images decoded with the `image` crate.
pub struct RasterImageExtractor;

impl RasterImageExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RasterImageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for RasterImageExtractor {
    fn name(&self) -> &str {
        "raster-image-extractor"
    }

    fn description(&self) -> &str {
        "Decodes JPEG, PNG and GIF images into thumbnails"
    }
}

impl DocumentExtractor for RasterImageExtractor {
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
        let mime_type = image::guess_format(content)
            .map(|format| format.to_mime_type())
            .unwrap_or(JPEG_MIME_TYPE);

        let decoded = match decode_raster(content, ctx.config().max_image_dimension) {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Image decoding failed, using blank thumbnail");
                None
            }
        };

        let mut summary = image_summary(content, url, ctx, mime_type);
        summary.thumbnail = thumbnail_for(decoded.as_ref(), ctx);
        Ok(summary)
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[JPEG_MIME_TYPE, "image/pjpeg", "image/png", "image/gif"]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["jpg", "jpeg", "png", "gif"]
    }

    fn is_image_format(&self) -> bool {
        true
    }
}

/// SVG images.
///
/// Text comes from `<title>`, `<desc>` and `<text>` nodes. The thumbnail is
/// the SVG itself with its root viewport resized, not a rasterization.
pub struct SvgExtractor;

impl SvgExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SvgExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SvgExtractor {
    fn name(&self) -> &str {
        "svg-extractor"
    }

    fn description(&self) -> &str {
        "Extracts SVG titles and text and resizes the SVG viewport as thumbnail"
    }
}

impl DocumentExtractor for SvgExtractor {
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
        let mut summary = image_summary(content, url, ctx, SVG_MIME_TYPE);
        let dim = ctx.config().thumbnail_dimension;
        let max_len = ctx.config().max_description_len;

        let source = decode_xml(content);
        let doc = match parse_document(&source) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Malformed SVG, using blank thumbnail");
                summary.thumbnail = thumbnail_for(None, ctx);
                return Ok(summary);
            }
        };

        if let Some(title) = doc
            .descendants()
            .find(|n| n.has_tag_name("title"))
            .map(node_text)
            .filter(|t| !t.is_empty())
        {
            summary.title = truncate_chars(&title, ctx.config().max_title_len);
        }

        for node in doc
            .descendants()
            .filter(|n| n.has_tag_name("desc") || n.has_tag_name("text"))
        {
            if !push_capped(&mut summary.description, &node_text(node), max_len) {
                break;
            }
        }

        summary.thumbnail = match resize_svg_viewport(&source, &doc, dim) {
            Some(svg) => Some(EncodedImage {
                mime_type: SVG_MIME_TYPE.to_string(),
                width: dim,
                height: dim,
                data: svg.into_bytes(),
            }),
            None => thumbnail_for(None, ctx),
        };
        Ok(summary)
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[SVG_MIME_TYPE]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["svg"]
    }

    fn supported_root_elements(&self) -> &[&str] {
        &["svg"]
    }

    fn is_image_format(&self) -> bool {
        true
    }
}

/// Rewrite the root start tag with `width`/`height` set to `dim`, keeping an
/// existing `viewBox` or deriving one from the original dimensions.
pub fn resize_svg_viewport(source: &str, doc: &roxmltree::Document<'_>, dim: u32) -> Option<String> {
    let root = doc.root_element();
    if !root.has_tag_name("svg") {
        return None;
    }

    let start = root.range().start;
    let end = start_tag_end(source, start)?;
    let self_closing = source[..end].ends_with('/');

    let prefix = root
        .tag_name()
        .namespace()
        .and_then(|uri| root.lookup_prefix(uri))
        .map(|p| format!("{p}:"))
        .unwrap_or_default();

    let mut tag = format!("<{prefix}svg");
    for ns in root.namespaces().filter(|ns| ns.uri() != XML_NAMESPACE) {
        match ns.name() {
            Some(name) => tag.push_str(&format!(" xmlns:{}=\"{}\"", name, escape_html(ns.uri()))),
            None => tag.push_str(&format!(" xmlns=\"{}\"", escape_html(ns.uri()))),
        }
    }

    let mut view_box = None;
    let mut original = (None, None);
    for attr in root.attributes() {
        if attr.namespace().is_none() {
            match attr.name() {
                "width" => {
                    original.0 = parse_length(attr.value());
                    continue;
                }
                "height" => {
                    original.1 = parse_length(attr.value());
                    continue;
                }
                "viewBox" => {
                    view_box = Some(attr.value().to_string());
                    continue;
                }
                _ => {}
            }
        }
        let attr_prefix = attr
            .namespace()
            .and_then(|uri| root.lookup_prefix(uri))
            .map(|p| format!("{p}:"))
            .unwrap_or_default();
        tag.push_str(&format!(" {}{}=\"{}\"", attr_prefix, attr.name(), escape_html(attr.value())));
    }

    let view_box = view_box.or_else(|| match original {
        (Some(w), Some(h)) => Some(format!("0 0 {w} {h}")),
        _ => None,
    });
    tag.push_str(&format!(" width=\"{dim}\" height=\"{dim}\""));
    if let Some(view_box) = view_box {
        tag.push_str(&format!(" viewBox=\"{}\"", escape_html(&view_box)));
    }
    tag.push_str(if self_closing { "/>" } else { ">" });

    Some(format!("{}{}{}", &source[..start], tag, &source[end + 1..]))
}

/// Index of the `>` closing the start tag beginning at `from`.
fn start_tag_end(source: &str, from: usize) -> Option<usize> {
    let mut quote = None;
    for (offset, c) in source[from..].char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return Some(from + offset),
            _ => {}
        }
    }
    None
}

/// Numeric prefix of an SVG length such as `120px` or `50.5`.
fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let numeric_len = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    value[..numeric_len].parse::<f64>().ok().filter(|v| *v > 0.0)
}
