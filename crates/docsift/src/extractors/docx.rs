//! Word document (DOCX) extractor.

use crate::core::context::ExtractionContext;
use crate::core::mime::DOCX_MIME_TYPE;
use crate::error::Result;
use crate::extraction::office_metadata::read_core_properties;
use crate::extraction::ooxml::{collect_hyperlinks, read_part_text, read_relationships};
use crate::extraction::zip::ZipContainer;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::types::Summary;
use url::Url;

use super::office::{PackageContent, package_summary, unreadable_package};

const DOCUMENT_PART: &str = "word/document.xml";

/// DOCX extractor.
///
/// Title, author and language come from the core properties; the body text
/// is the paragraph text of `word/document.xml`, cut off at the description
/// limit. Hyperlinks are resolved through the document relationships.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for DocxExtractor {
    fn name(&self) -> &str {
        "docx-extractor"
    }

    fn description(&self) -> &str {
        "Extracts text, properties and hyperlinks from Word documents"
    }
}

impl DocumentExtractor for DocxExtractor {
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
        let Some(mut container) = ZipContainer::open(content) else {
            return Ok(unreadable_package(url, DOCX_MIME_TYPE));
        };

        let core = read_core_properties(&mut container);
        let part = container
            .get_entry(DOCUMENT_PART)
            .map(|xml| read_part_text(&xml, ctx.config().max_description_len))
            .unwrap_or_default();

        let mut links = ctx.link_collector(url);
        collect_hyperlinks(&read_relationships(&mut container, DOCUMENT_PART), &part.anchors, &mut links);

        let package = PackageContent {
            title: core.title.unwrap_or_default(),
            authors: core.creator.into_iter().collect(),
            declared_language: core.language,
            text: part.text,
            links: links.into_links(),
        };
        Ok(package_summary(url, DOCX_MIME_TYPE, package, ctx))
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[DOCX_MIME_TYPE]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }
}
