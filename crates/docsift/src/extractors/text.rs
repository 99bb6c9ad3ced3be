//! Plain text extractor, also the universal fallback.

use crate::core::context::ExtractionContext;
use crate::core::mime::PLAIN_TEXT_MIME_TYPE;
use crate::error::{DocsiftError, Result};
use crate::extraction::text::summarize_text;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::text::{decode_text, looks_binary};
use crate::types::Summary;
use url::Url;

/// Plain text extractor.
///
/// Handles `text/plain` and friends directly, and every other format when
/// its own extractor fails. Binary input is rejected with
/// [`DocsiftError::UnsupportedFormat`].
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub const NAME: &'static str = "plain-text-extractor";

    /// Create a new plain text extractor.
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PlainTextExtractor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Summarizes plain text and serves as the fallback for every other format"
    }
}

impl DocumentExtractor for PlainTextExtractor {
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
        if looks_binary(content) {
            return Err(DocsiftError::UnsupportedFormat(format!(
                "{} does not look like text",
                url.as_str()
            )));
        }

        let text = decode_text(content, None);
        Ok(summarize_text(&text, url, ctx, PLAIN_TEXT_MIME_TYPE))
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[
            PLAIN_TEXT_MIME_TYPE,
            "text/csv",
            "text/tab-separated-values",
            "text/markdown",
            "text/x-markdown",
        ]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "csv", "tsv", "md", "log", "text"]
    }

    fn priority(&self) -> i32 {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://example.com/readme.txt").unwrap()
    }

    #[test]
    fn test_plain_text_extraction() {
        let extractor = PlainTextExtractor::new();
        let ctx = ExtractionContext::default();
        let content = b"Release notes\nSee https://example.com/changes for details.";

        let summary = extractor.extract(content, &url(), &ctx).unwrap();
        assert_eq!(summary.mime_type, "text/plain");
        assert!(summary.title.is_empty());
        assert!(summary.description.starts_with("Release notes"));
        assert_eq!(summary.links.len(), 1);
    }

    #[test]
    fn test_latin1_text_is_decoded() {
        let extractor = PlainTextExtractor::new();
        let summary = extractor
            .extract(b"Caf\xe9 cr\xe8me br\xfbl\xe9e \xe0 la fran\xe7aise", &url(), &ExtractionContext::default())
            .unwrap();
        assert!(summary.description.starts_with("Café crème"));
    }

    #[test]
    fn test_binary_input_rejected() {
        let extractor = PlainTextExtractor::new();
        let err = extractor
            .extract(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR", &url(), &ExtractionContext::default())
            .unwrap_err();
        assert!(matches!(err, DocsiftError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_plugin_metadata() {
        let extractor = PlainTextExtractor::new();
        assert_eq!(extractor.name(), "plain-text-extractor");
        assert!(extractor.supported_mime_types().contains(&"text/plain"));
        assert!(extractor.supported_extensions().contains(&"csv"));
    }
}
