//! Shared plain-text pipeline.
//!
//! Every extractor can hand recovered text to [`summarize_text`] to obtain a
//! baseline summary: description, language, `http(s)` links and a
//! preformatted HTML body.

use crate::core::context::ExtractionContext;
use crate::links::LinkCollector;
use crate::text::string_utils::escape_html;
use crate::types::{RenderedContent, Summary};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static HTTP_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s"'<>;,]+"#).expect("HTTP URL regex pattern is valid and should compile"));

/// Trailing characters that end sentences rather than URLs.
const URL_TRAILING_PUNCTUATION: &[char] = &['.', ')', ']', '}', '!', '?', ':'];

/// Build a summary from plain text.
///
/// Never fails: empty text yields an empty summary with the body set.
pub fn summarize_text(text: &str, url: &Url, ctx: &ExtractionContext, mime_type: &str) -> Summary {
    let mut summary = Summary::new(url, mime_type, RenderedContent::html(render_preformatted(text)));

    let language = ctx.guess_language(text, Some(url));
    let summarization = ctx.summarize(text, language.as_ref());
    summary.description = summarization.description;
    summary.word_cloud = summarization.word_cloud;
    summary.language = language;

    let mut links = ctx.link_collector(url);
    collect_http_links(text, &mut links);
    summary.links = links.into_links();

    summary
}

/// Fill only the fields of `summary` that are still empty from `text`.
pub fn backfill_from_text(summary: &mut Summary, text: &str, ctx: &ExtractionContext) {
    let fallback = summarize_text(text, &summary.url, ctx, &summary.mime_type);
    if summary.description.trim().is_empty() {
        summary.description = fallback.description;
        if summary.word_cloud.is_none() {
            summary.word_cloud = fallback.word_cloud;
        }
    }
    if summary.language.is_none() {
        summary.language = fallback.language;
    }
    if summary.links.is_empty() {
        summary.links = fallback.links;
    }
}

/// Add every literal `http://` / `https://` substring to the collector.
pub fn collect_http_links(text: &str, links: &mut LinkCollector<'_>) {
    for found in HTTP_URL.find_iter(text) {
        let candidate = found.as_str().trim_end_matches(URL_TRAILING_PUNCTUATION);
        if let Ok(url) = Url::parse(candidate) {
            links.add_url(url, "");
        }
        if links.is_full() {
            break;
        }
    }
}

/// Minimal HTML shell around preformatted text.
pub fn render_preformatted(text: &str) -> String {
    format!("<html><body><pre>{}</pre></body></html>", escape_html(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ExtractionConfig;

    fn url() -> Url {
        Url::parse("https://example.com/notes.txt").unwrap()
    }

    #[test]
    fn test_summarize_text_links_and_description() {
        let ctx = ExtractionContext::default();
        let text = "See https://a.example/x, and (https://b.example/y). Also \"https://a.example/x\" again;\
                    plus <https://c.example/z>";
        let summary = summarize_text(text, &url(), &ctx, "text/plain");

        let links: Vec<&str> = summary.links.keys().map(Url::as_str).collect();
        assert_eq!(
            links,
            vec!["https://a.example/x", "https://b.example/y", "https://c.example/z"]
        );
        assert!(summary.title.is_empty());
        assert!(summary.description.starts_with("See https://a.example/x"));
        assert!(summary.body.content.starts_with("<html><body><pre>"));
        assert!(summary.body.content.contains("&lt;https://c.example/z&gt;"));
    }

    #[test]
    fn test_summarize_text_respects_caps() {
        let config = ExtractionConfig {
            max_description_len: 10,
            max_links_per_document: 2,
            ..Default::default()
        };
        let ctx = ExtractionContext::new(config);
        let text = "http://one.example/ http://two.example/ http://three.example/";
        let summary = summarize_text(text, &url(), &ctx, "text/plain");

        assert_eq!(summary.description.chars().count(), 10);
        assert_eq!(summary.links.len(), 2);
    }

    #[test]
    fn test_summarize_empty_text() {
        let summary = summarize_text("", &url(), &ExtractionContext::default(), "text/plain");
        assert!(summary.is_empty());
        assert_eq!(summary.body.content, "<html><body><pre></pre></body></html>");
    }

    #[test]
    fn test_backfill_keeps_existing_fields() {
        let ctx = ExtractionContext::default();
        let mut summary = summarize_text("", &url(), &ctx, "text/html");
        summary.title = "Kept".to_string();
        summary.description = "existing".to_string();

        backfill_from_text(&mut summary, "other text https://x.example/", &ctx);
        assert_eq!(summary.title, "Kept");
        assert_eq!(summary.description, "existing");
        assert_eq!(summary.links.len(), 1);
    }
}
