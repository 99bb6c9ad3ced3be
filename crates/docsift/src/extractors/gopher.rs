//! Gopher menu extractor.

use crate::core::context::ExtractionContext;
use crate::core::mime::GOPHER_MIME_TYPE;
use crate::error::Result;
use crate::extraction::gopher::gopher_menu_to_html;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::text::decode_text;
use crate::types::Summary;
use url::Url;

use super::html::HtmlExtractor;

/// Gopher menu extractor.
///
/// The menu is transcoded to HTML and summarized by [`HtmlExtractor`].
pub struct GopherExtractor;

impl GopherExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GopherExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for GopherExtractor {
    fn name(&self) -> &str {
        "gopher-extractor"
    }

    fn description(&self) -> &str {
        "Summarizes Gopher menus through their HTML rendering"
    }
}

impl DocumentExtractor for GopherExtractor {
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
        let menu = decode_text(content, None);
        let html = gopher_menu_to_html(&menu);
        let mut summary = HtmlExtractor::new().extract_html(&html, url, ctx, None);
        summary.mime_type = GOPHER_MIME_TYPE.to_string();
        Ok(summary)
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[GOPHER_MIME_TYPE, "text/x-gopher-menu"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gopher_menu() {
        let menu = b"iWelcome to the hole\tfake\t(NULL)\t0\r\n\
                     1Phlog\t/phlog\tgopher.example\t70\r\n\
                     hHomepage\tURL:https://www.example.org/\tgopher.example\t70\r\n\
                     .\r\n";
        let url = Url::parse("gopher://gopher.example/").unwrap();
        let summary = GopherExtractor::new()
            .extract(menu, &url, &ExtractionContext::default())
            .unwrap();

        assert_eq!(summary.mime_type, GOPHER_MIME_TYPE);
        assert!(summary.description.contains("Welcome to the hole"));
        let phlog = Url::parse("gopher://gopher.example:70/1phlog").unwrap();
        assert_eq!(summary.links.get(&phlog).map(String::as_str), Some("Phlog"));
        assert!(summary.links.contains_key(&Url::parse("https://www.example.org/").unwrap()));
    }
}
