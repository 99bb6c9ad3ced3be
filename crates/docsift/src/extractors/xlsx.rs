//! Excel workbook (XLSX) extractor.

use crate::core::context::ExtractionContext;
use crate::core::mime::EXCEL_MIME_TYPE;
use crate::error::Result;
use crate::extraction::office_metadata::{read_app_properties, read_core_properties};
use crate::extraction::ooxml::{collect_hyperlinks, read_part_text, read_relationships};
use crate::extraction::zip::ZipContainer;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::types::Summary;
use ahash::AHashMap;
use url::Url;

use super::office::{PackageContent, package_summary, unreadable_package};

const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Excel workbook extractor.
///
/// Cell values are not evaluated: the shared string table stands in for the
/// workbook text. Hyperlinks come from each worksheet's relationships.
pub struct XlsxExtractor;

impl XlsxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XlsxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for XlsxExtractor {
    fn name(&self) -> &str {
        "xlsx-extractor"
    }

    fn description(&self) -> &str {
        "Extracts shared strings and hyperlinks from Excel workbooks"
    }
}

impl DocumentExtractor for XlsxExtractor {
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
        let Some(mut container) = ZipContainer::open(content) else {
            return Ok(unreadable_package(url, EXCEL_MIME_TYPE));
        };

        let core = read_core_properties(&mut container);
        let parts = read_app_properties(&mut container)
            .map(|app| app.titles_of_parts)
            .unwrap_or_default();
        let part_count = if parts.is_empty() { container.len() } else { parts.len().min(container.len()) };

        let shared = container
            .get_entry(SHARED_STRINGS_PART)
            .map(|xml| read_part_text(&xml, ctx.config().max_description_len))
            .unwrap_or_default();

        let no_anchors = AHashMap::new();
        let mut links = ctx.link_collector(url);
        for number in 1..=part_count {
            let sheet = format!("xl/worksheets/sheet{number}.xml");
            collect_hyperlinks(&read_relationships(&mut container, &sheet), &no_anchors, &mut links);
        }

        let title = core
            .title
            .or_else(|| parts.first().cloned())
            .unwrap_or_default();

        let package = PackageContent {
            title,
            authors: core.creator.into_iter().collect(),
            declared_language: core.language,
            text: shared.text,
            links: links.into_links(),
        };
        Ok(package_summary(url, EXCEL_MIME_TYPE, package, ctx))
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[EXCEL_MIME_TYPE]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["xlsx"]
    }
}
