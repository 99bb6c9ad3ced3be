//! PDF extractor built on the linear text-operator scan.

use crate::core::context::ExtractionContext;
use crate::core::mime::PDF_MIME_TYPE;
use crate::error::Result;
use crate::extraction::pdf::extract_pdf_text;
use crate::extraction::text::{render_preformatted, summarize_text};
use crate::plugins::{DocumentExtractor, Plugin};
use crate::text::truncate_chars;
use crate::types::{RenderedContent, Summary};
use url::Url;

/// PDF document extractor.
///
/// Text is recovered without interpreting the document structure, see
/// [`extract_pdf_text`]. A PDF that yields no text is summarized by its URL.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PdfExtractor {
    fn name(&self) -> &str {
        "pdf-extractor"
    }

    fn description(&self) -> &str {
        "Recovers text from PDF content streams"
    }
}

impl DocumentExtractor for PdfExtractor {
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
        let text = extract_pdf_text(content, &ctx.config().pdf);
        tracing::debug!(url = %url, chars = text.len(), "PDF text recovered");

        if text.is_empty() {
            let mut summary = Summary::new(url, PDF_MIME_TYPE, RenderedContent::html(render_preformatted("")));
            summary.description = truncate_chars(url.as_str(), ctx.config().max_description_len);
            return Ok(summary);
        }

        Ok(summarize_text(&text, url, ctx, PDF_MIME_TYPE))
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[PDF_MIME_TYPE, "application/x-pdf"]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}
