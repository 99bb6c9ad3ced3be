//! EPUB extractor.
//!
//! Package metadata comes from the first `.opf` entry; XHTML chapters go
//! through the HTML extractor and the chapter summaries are merged. Once the
//! description is full, later chapters only contribute links.

use crate::core::context::ExtractionContext;
use crate::core::mime::EPUB_MIME_TYPE;
use crate::error::Result;
use crate::extraction::text::render_preformatted;
use crate::extraction::xml::{decode_xml, parse_document};
use crate::extraction::zip::ZipContainer;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::text::{collapse_whitespace, decode_text, push_capped, truncate_chars};
use crate::types::{LanguageTag, RenderedContent, Summary};
use roxmltree::Node;
use url::Url;

use super::html::HtmlExtractor;

/// Maximum element depth searched for Dublin Core fields in the OPF.
pub const MAX_OPF_DEPTH: usize = 8;

const CHAPTER_SUFFIXES: &[&str] = &[".html", ".xhtml", ".htm"];

/// Dublin Core fields of an OPF package document.
#[derive(Debug, Default, Clone, PartialEq)]
struct OpfMetadata {
    title: Option<String>,
    creator: Option<String>,
    language: Option<String>,
    identifier: Option<String>,
}

impl OpfMetadata {
    fn parse(xml_bytes: &[u8]) -> Self {
        let xml = decode_xml(xml_bytes);
        let doc = match parse_document(&xml) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed OPF package");
                return Self::default();
            }
        };

        let mut metadata = Self::default();
        walk_opf(doc.root_element(), 0, &mut metadata);
        metadata
    }

    fn slot(&mut self, local_name: &str) -> Option<&mut Option<String>> {
        match local_name {
            "title" => Some(&mut self.title),
            "creator" => Some(&mut self.creator),
            "language" => Some(&mut self.language),
            "identifier" => Some(&mut self.identifier),
            _ => None,
        }
    }
}

fn walk_opf(node: Node<'_, '_>, depth: usize, metadata: &mut OpfMetadata) {
    if depth > MAX_OPF_DEPTH {
        return;
    }
    for child in node.children().filter(Node::is_element) {
        if let Some(slot) = metadata.slot(child.tag_name().name())
            && slot.is_none()
        {
            let text = collapse_whitespace(child.text().unwrap_or_default());
            if !text.is_empty() {
                *slot = Some(text);
            }
        }
        walk_opf(child, depth + 1, metadata);
    }
}

/// EPUB e-book extractor.
pub struct EpubExtractor;

impl EpubExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EpubExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for EpubExtractor {
    fn name(&self) -> &str {
        "epub-extractor"
    }

    fn description(&self) -> &str {
        "Extracts package metadata and chapter text from EPUB books"
    }
}

impl DocumentExtractor for EpubExtractor {
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
        let Some(mut container) = ZipContainer::open(content) else {
            tracing::debug!(url = %url, "EPUB archive unreadable, returning empty summary");
            return Ok(Summary::new(url, EPUB_MIME_TYPE, RenderedContent::html(render_preformatted(""))));
        };

        let names = container.entry_names();
        let metadata = names
            .iter()
            .find(|name| name.to_ascii_lowercase().ends_with(".opf"))
            .and_then(|name| container.get_entry(name))
            .map(|bytes| OpfMetadata::parse(&bytes))
            .unwrap_or_default();

        let max_len = ctx.config().max_description_len;
        let html = HtmlExtractor::new();
        let mut chapters = String::new();
        let mut links = ctx.link_collector(url);
        let mut chapter_count = 0usize;
        let mut description_full = false;

        for name in names.iter().filter(|name| {
            let lower = name.to_ascii_lowercase();
            CHAPTER_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
        }) {
            if description_full && links.is_full() {
                break;
            }
            let Some(bytes) = container.get_entry(name) else {
                continue;
            };
            let raw = decode_text(&bytes, None);
            if description_full {
                links.extend(html.extract_links(&raw, url, ctx));
            } else {
                let chapter = html.extract_html(&raw, url, ctx, None);
                description_full = !push_capped(&mut chapters, &chapter.description, max_len);
                links.extend(chapter.links);
                chapter_count += 1;
            }
        }
        tracing::debug!(url = %url, chapters = chapter_count, "EPUB chapters merged");

        let mut description = String::new();
        for part in [
            metadata.title.clone(),
            metadata.creator.clone(),
            metadata.language.clone(),
            metadata.identifier.as_ref().map(|id| format!("URN-{id}")),
            Some(chapters),
        ]
        .into_iter()
        .flatten()
        {
            if !push_capped(&mut description, &part, max_len) {
                break;
            }
        }

        let language = metadata
            .language
            .as_deref()
            .and_then(LanguageTag::parse)
            .or_else(|| ctx.guess_language(&description, Some(url)));

        let mut summary = Summary::new(url, EPUB_MIME_TYPE, RenderedContent::html(render_preformatted(&description)));
        summary.title = truncate_chars(metadata.title.as_deref().unwrap_or_default(), ctx.config().max_title_len);
        summary.authors = metadata.creator.into_iter().collect();
        summary.description = description;
        summary.language = language;
        summary.links = links.into_links();
        Ok(summary)
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[EPUB_MIME_TYPE]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["epub"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ExtractionConfig;
    use std::io::{Cursor, Write};

    const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:isbn:9780000000001</dc:identifier>
    <dc:title>A Short Book</dc:title>
    <dc:creator>Ann Author</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
</package>"#;

    fn build_epub(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::<()>::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("mimetype", options).unwrap();
        zip.write_all(EPUB_MIME_TYPE.as_bytes()).unwrap();
        for (name, body) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_epub_extraction() {
        let bytes = build_epub(&[
            ("OEBPS/content.opf", OPF),
            (
                "OEBPS/ch1.xhtml",
                r#"<html><body><p>Chapter one text.</p><a href="https://example.org/notes">Notes</a></body></html>"#,
            ),
            ("OEBPS/ch2.xhtml", "<html><body><p>Chapter two text.</p></body></html>"),
        ]);
        let url = Url::parse("https://example.com/book.epub").unwrap();
        let summary = EpubExtractor::new()
            .extract(&bytes, &url, &ExtractionContext::default())
            .unwrap();

        assert_eq!(summary.title, "A Short Book");
        assert_eq!(summary.authors, vec!["Ann Author".to_string()]);
        assert_eq!(summary.language.as_ref().map(|l| l.as_str()), Some("en"));
        assert!(
            summary
                .description
                .starts_with("A Short Book Ann Author en URN-urn:isbn:9780000000001 Chapter one text.")
        );
        assert!(summary.description.contains("Chapter two text."));
        assert!(summary.links.contains_key(&Url::parse("https://example.org/notes").unwrap()));
    }

    #[test]
    fn test_chapters_after_full_description_only_add_links() {
        let config = ExtractionConfig {
            max_description_len: 20,
            ..ExtractionConfig::default()
        };
        let ctx = ExtractionContext::new(config);
        let bytes = build_epub(&[
            ("OEBPS/ch1.xhtml", "<html><body><p>The first chapter fills the whole description.</p></body></html>"),
            (
                "OEBPS/ch2.xhtml",
                r#"<html><body><p>Second chapter prose.</p><a href="https://example.org/later">Later</a></body></html>"#,
            ),
        ]);
        let url = Url::parse("https://example.com/long.epub").unwrap();
        let summary = EpubExtractor::new().extract(&bytes, &url, &ctx).unwrap();

        assert!(summary.description.chars().count() <= 20);
        assert!(!summary.description.contains("Second"));
        assert!(summary.links.contains_key(&Url::parse("https://example.org/later").unwrap()));
    }

    #[test]
    fn test_opf_depth_is_bounded() {
        let mut xml = String::new();
        for _ in 0..(MAX_OPF_DEPTH + 2) {
            xml.push_str("<x>");
        }
        xml.push_str("<title>Deep</title>");
        for _ in 0..(MAX_OPF_DEPTH + 2) {
            xml.push_str("</x>");
        }
        assert_eq!(OpfMetadata::parse(xml.as_bytes()).title, None);
        assert_eq!(OpfMetadata::parse(b"<package><title>Shallow</title></package>").title.as_deref(), Some("Shallow"));
    }

    #[test]
    fn test_epub_without_opf() {
        let bytes = build_epub(&[("ch.html", "<html><body><p>Loose chapter.</p></body></html>")]);
        let url = Url::parse("https://example.com/loose.epub").unwrap();
        let summary = EpubExtractor::new()
            .extract(&bytes, &url, &ExtractionContext::default())
            .unwrap();
        assert!(summary.title.is_empty());
        assert_eq!(summary.description, "Loose chapter.");
    }
}
