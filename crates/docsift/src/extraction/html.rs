//! HTML preprocessing and text conversion.
//!
//! Crawled HTML is frequently truncated or malformed. The helpers here
//! prepare markup for DOM parsing (script/style removal, wrapper synthesis)
//! and provide the regex based "crude" fallbacks used when the DOM yields
//! nothing. Text conversion goes through `html-to-markdown-rs`.

use crate::error::{DocsiftError, Result};
use crate::text::string_utils::{charset_from_content_type, collapse_whitespace};
use html_to_markdown_rs::{ConversionOptions, PreprocessingOptions, convert as convert_html};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{any::Any, thread};

const LARGE_HTML_STACK_THRESHOLD_BYTES: usize = 512 * 1024;
const HTML_CONVERSION_STACK_SIZE_BYTES: usize = 16 * 1024 * 1024;

/// Bytes inspected when sniffing a declared charset.
const CHARSET_SNIFF_LEN: usize = 2048;

static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b.*?(?:</script\s*>|\z)").expect("Script block regex pattern is valid and should compile")
});
static STYLE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<style\b.*?(?:</style\s*>|\z)").expect("Style block regex pattern is valid and should compile")
});
static INVISIBLE_ENTITIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)&(?:shy|zwnj|zwj|lrm|rlm);").expect("Invisible entities regex pattern is valid and should compile")
});
static NBSP_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)&nbsp;").expect("Nbsp entity regex pattern is valid and should compile"));
static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<html[\s>]").expect("HTML tag regex pattern is valid and should compile"));
static HEAD_ELEMENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<title\b[^>]*>.*?</title\s*>|<(?:meta|link|base)\b[^>]*>")
        .expect("Head elements regex pattern is valid and should compile")
});
static CRUDE_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title").expect("Crude title regex pattern is valid and should compile")
});
static BODY_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<body[^>]*>").expect("Body start regex pattern is valid and should compile"));
static ANY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("Any tag regex pattern is valid and should compile"));
static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("Comment regex pattern is valid and should compile"));
static MARKDOWN_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("Markdown image regex pattern is valid and should compile")
});
static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("Markdown link regex pattern is valid and should compile")
});
static MARKDOWN_MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s{0,3}(?:#{1,6}\s+|>\s?|[-*+]\s+|\d+\.\s+)|\*+|__|`+|^\s*[-*_]{3,}\s*$|\|")
        .expect("Markdown markup regex pattern is valid and should compile")
});

/// Remove `<script>`/`<style>` blocks (including unterminated ones) and
/// entities that only affect rendering.
pub fn clean_html(raw: &str) -> String {
    let cleaned = SCRIPT_BLOCK.replace_all(raw, "");
    let cleaned = STYLE_BLOCK.replace_all(&cleaned, "");
    let cleaned = INVISIBLE_ENTITIES.replace_all(&cleaned, "");
    NBSP_ENTITY.replace_all(&cleaned, " ").into_owned()
}

pub fn has_html_element(raw: &str) -> bool {
    HTML_TAG.is_match(raw)
}

/// Wrap a fragment in `<html><head>…</head><body>…</body></html>`.
///
/// Only `title`, `meta`, `link` and `base` elements are moved to the head;
/// everything else stays in the body.
pub fn synthesize_document(fragment: &str) -> String {
    let head: String = HEAD_ELEMENTS.find_iter(fragment).map(|m| m.as_str()).collect();
    let body = HEAD_ELEMENTS.replace_all(fragment, "");
    format!("<html><head>{head}</head><body>{body}</body></html>")
}

/// Title between literal `<title` and `</title` markers.
pub fn crude_title(raw: &str) -> Option<String> {
    CRUDE_TITLE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| collapse_whitespace(&decode_basic_entities(m.as_str())))
        .filter(|title| !title.is_empty())
}

/// Tag-stripped text of the `<body>` (or the whole input when there is no
/// body element).
pub fn crude_body_text(raw: &str) -> String {
    let body = match BODY_START.find(raw) {
        Some(m) => &raw[m.end()..],
        None => raw,
    };
    strip_tags(body)
}

/// Remove comments and tags, decode the basic entities and collapse whitespace.
pub fn strip_tags(raw: &str) -> String {
    let without_comments = COMMENT.replace_all(raw, " ");
    let text = ANY_TAG.replace_all(&without_comments, " ");
    collapse_whitespace(&decode_basic_entities(&text))
}

fn decode_basic_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Charset declared in a `<meta>` tag near the start of the document.
pub fn sniff_charset(bytes: &[u8]) -> Option<String> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(CHARSET_SNIFF_LEN)]);
    let lower = head.to_ascii_lowercase();
    let meta = lower.find("<meta")?;
    charset_from_content_type(&lower[meta..])
}

fn conversion_options() -> ConversionOptions {
    ConversionOptions {
        extract_metadata: false,
        hocr_spatial_tables: false,
        preprocessing: PreprocessingOptions {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn html_requires_large_stack(len: usize) -> bool {
    len >= LARGE_HTML_STACK_THRESHOLD_BYTES
}

fn convert_html_with_options(html: &str, options: ConversionOptions) -> Result<String> {
    convert_html(html, Some(options))
        .map_err(|e| DocsiftError::parsing(format!("Failed to convert HTML to Markdown: {}", e)))
}

fn run_on_dedicated_stack<T, F>(job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("docsift-html-conversion".to_string())
        .stack_size(HTML_CONVERSION_STACK_SIZE_BYTES)
        .spawn(job)
        .map_err(|err| DocsiftError::Other(format!("Failed to spawn HTML conversion thread: {}", err)))?;

    match handle.join() {
        Ok(result) => result,
        Err(panic) => {
            let reason = extract_panic_reason(&panic);
            Err(DocsiftError::Other(format!("HTML conversion panicked: {}", reason)))
        }
    }
}

pub(crate) fn extract_panic_reason(panic: &Box<dyn Any + Send + 'static>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Convert HTML to Markdown.
///
/// Large documents are converted on a thread with a bigger stack since the
/// converter recurses over the DOM.
pub fn convert_html_to_markdown(html: &str) -> Result<String> {
    let options = conversion_options();
    if html_requires_large_stack(html.len()) {
        let html = html.to_string();
        run_on_dedicated_stack(move || convert_html_with_options(&html, options))
    } else {
        convert_html_with_options(html, options)
    }
}

/// Reduce Markdown to readable plain text.
pub fn markdown_to_text(markdown: &str) -> String {
    let text = MARKDOWN_IMAGE.replace_all(markdown, "$1");
    let text = MARKDOWN_LINK.replace_all(&text, "$1");
    let text = MARKDOWN_MARKUP.replace_all(&text, " ");
    collapse_whitespace(&text)
}

/// Visible text of an HTML document.
///
/// Falls back to tag stripping when Markdown conversion fails.
pub fn html_to_text(html: &str) -> String {
    match convert_html_to_markdown(html) {
        Ok(markdown) => markdown_to_text(&markdown),
        Err(e) => {
            tracing::debug!(error = %e, "Markdown conversion failed, stripping tags instead");
            crude_body_text(html)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_removes_scripts_styles_and_entities() {
        let html = "<p>a&nbsp;b&shy;c</p><script>var x = '<p>';</script><STYLE>p{}</STYLE><script>unterminated";
        assert_eq!(clean_html(html), "<p>a bc</p>");
    }

    #[test]
    fn test_synthesize_document() {
        let fragment = "<title>T</title><meta name=\"robots\" content=\"noindex\"><p>Body <b>text</b></p>";
        let doc = synthesize_document(fragment);
        assert_eq!(
            doc,
            "<html><head><title>T</title><meta name=\"robots\" content=\"noindex\"></head>\
             <body><p>Body <b>text</b></p></body></html>"
        );
        assert!(has_html_element(&doc));
        assert!(!has_html_element(fragment));
    }

    #[test]
    fn test_crude_title_and_body() {
        let raw = "<html><head><title> Broken &amp; <b>bad</title></head><body><p>One</p><!-- c --><p>Two</p>";
        assert_eq!(crude_title(raw).as_deref(), Some("Broken & <b>bad"));
        assert_eq!(crude_body_text(raw), "One Two");
        assert_eq!(crude_title("<p>none</p>"), None);
    }

    #[test]
    fn test_sniff_charset() {
        let html = b"<html><head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=ISO-8859-1\">";
        assert_eq!(sniff_charset(html).as_deref(), Some("iso-8859-1"));
        assert_eq!(sniff_charset(b"<meta charset=\"utf-8\">").as_deref(), Some("utf-8"));
        assert_eq!(sniff_charset(b"<p>charset=utf-8</p>"), None);
    }

    #[test]
    fn test_markdown_to_text() {
        let markdown = "# Title\n\nSome **bold** and [a link](https://x.example/) ![alt](i.png)\n\n- item";
        assert_eq!(markdown_to_text(markdown), "Title Some bold and a link alt item");
    }

    #[test]
    fn test_html_to_text() {
        let text = html_to_text("<html><body><h1>Heading</h1><p>Paragraph with <em>text</em>.</p></body></html>");
        assert!(text.contains("Heading"));
        assert!(text.contains("Paragraph with"));
        assert!(!text.contains('<'));
    }
}
