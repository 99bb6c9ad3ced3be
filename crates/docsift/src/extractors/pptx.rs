//! PowerPoint presentation (PPTX) extractor.

use crate::core::context::ExtractionContext;
use crate::core::mime::POWER_POINT_MIME_TYPE;
use crate::error::Result;
use crate::extraction::office_metadata::{read_app_properties, read_core_properties};
use crate::extraction::ooxml::{collect_hyperlinks, read_part_text, read_relationships};
use crate::extraction::zip::ZipContainer;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::text::push_capped;
use crate::types::Summary;
use url::Url;

use super::office::{PackageContent, package_summary, unreadable_package};

/// PowerPoint presentation extractor.
///
/// Walks `ppt/slides/slide1.xml` up to the slide count declared in
/// `docProps/app.xml` (or the number of archive entries when that part is
/// missing). Slides missing from a truncated archive are skipped.
pub struct PptxExtractor;

impl PptxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PptxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PptxExtractor {
    fn name(&self) -> &str {
        "pptx-extractor"
    }

    fn description(&self) -> &str {
        "Extracts slide text and hyperlinks from PowerPoint presentations"
    }
}

fn slide_part(number: usize) -> String {
    format!("ppt/slides/slide{number}.xml")
}

impl DocumentExtractor for PptxExtractor {
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
        let Some(mut container) = ZipContainer::open(content) else {
            return Ok(unreadable_package(url, POWER_POINT_MIME_TYPE));
        };

        let max_len = ctx.config().max_description_len;
        let core = read_core_properties(&mut container);
        // A package cannot hold more slides than entries.
        let slide_count = read_app_properties(&mut container)
            .and_then(|app| app.slides)
            .map_or(container.len(), |slides| (slides as usize).min(container.len()));

        let mut text = String::new();
        let mut language = core.language;
        let mut links = ctx.link_collector(url);

        for number in 1..=slide_count {
            let part_name = slide_part(number);
            let Some(xml) = container.get_entry(&part_name) else {
                continue;
            };
            let part = read_part_text(&xml, max_len);
            push_capped(&mut text, &part.text, max_len);
            if language.is_none() {
                language = part.language;
            }
            collect_hyperlinks(&read_relationships(&mut container, &part_name), &part.anchors, &mut links);
        }
        tracing::debug!(url = %url, slides = slide_count, "Presentation slides scanned");

        let package = PackageContent {
            title: core.title.unwrap_or_default(),
            authors: core.creator.into_iter().collect(),
            declared_language: language,
            text,
            links: links.into_links(),
        };
        Ok(package_summary(url, POWER_POINT_MIME_TYPE, package, ctx))
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[POWER_POINT_MIME_TYPE]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pptx"]
    }
}
