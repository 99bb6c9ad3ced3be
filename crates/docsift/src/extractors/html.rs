//! HTML extractor.
//!
//! Crawled pages are parsed with `scraper` after light cleanup. Every field
//! has a fallback chain, so a truncated or malformed page still produces a
//! usable summary:
//!
//! - title: `<title>`, then the headings, then a regex over the raw markup
//! - language: `<html lang>`, then `Content-Language`, then the charset, then the guesser
//! - description: the configured summarizer over the meta description and
//!   the body text, then the tag-stripped body
//! - links: anchors, frames and images with alt text, then a raw `http(s)://` scan

use crate::core::config::SummarizerStrategy;
use crate::core::context::ExtractionContext;
use crate::core::mime::HTML_MIME_TYPE;
use crate::error::Result;
use crate::extraction::html::{
    clean_html, crude_body_text, crude_title, has_html_element, html_to_text, sniff_charset, strip_tags,
    synthesize_document,
};
use crate::extraction::text::{backfill_from_text, collect_http_links};
use crate::language_detection::language_from_charset;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::text::string_utils::charset_from_content_type;
use crate::text::{collapse_whitespace, decode_text, truncate_chars};
use crate::types::{LanguageTag, RenderedContent, Summary};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Normalized source and canonical URLs must differ by at least this many edits.
pub const MIN_CANONICAL_DISTANCE: usize = 2;

/// Redirect targets shorter than this are ignored.
pub const MIN_REDIRECT_URL_LEN: usize = 12;

const HEADING_SEPARATOR: &str = " .. ";

macro_rules! selector {
    ($name:ident, $css:literal) => {
        static $name: Lazy<Selector> =
            Lazy::new(|| Selector::parse($css).expect("CSS selector is valid and should parse"));
    };
}

selector!(TITLE, "title");
selector!(HEADINGS, "h1, h2, h3, h4, h5, h6");
selector!(HTML_LANG, "html[lang]");
selector!(NAMED_META, "meta[name][content]");
selector!(HTTP_EQUIV_META, "meta[http-equiv][content]");
selector!(CHARSET_META, "meta[charset]");
selector!(BASE, "base[href]");
selector!(ANCHORS, "a[href]");
selector!(FRAMES, "frame[src], iframe[src]");
selector!(ALT_IMAGES, "img[src][alt]");
selector!(CANONICAL, "link[rel][href]");

/// HTML and XHTML extractor.
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Summarize already decoded markup.
    ///
    /// Used directly by the EPUB and Gopher extractors, which produce HTML
    /// of their own. `charset` is the encoding the bytes were declared in,
    /// if any, and only feeds language inference.
    pub fn extract_html(&self, raw: &str, url: &Url, ctx: &ExtractionContext, charset: Option<&str>) -> Summary {
        let cleaned = clean_html(raw);
        let source = if has_html_element(&cleaned) {
            cleaned
        } else {
            synthesize_document(&cleaned)
        };

        let mut summary = Summary::new(url, HTML_MIME_TYPE, RenderedContent::html(source.clone()));
        let doc = Html::parse_document(&source);
        let config = ctx.config();

        summary.robot_directives = robot_directives(&doc);
        summary.title = truncate_chars(&page_title(&doc, raw, config.max_title_len), config.max_title_len);
        summary.authors = named_meta(&doc, "author").into_iter().collect();

        let body_text = html_to_text(&source);
        let meta_description = named_meta(&doc, "description");
        let language = page_language(&doc, charset).or_else(|| {
            let sample = format!("{} {}", summary.title, body_text);
            ctx.guess_language(&sample, Some(url))
        });

        let summary_input = match (config.summarizer_strategy, meta_description) {
            (SummarizerStrategy::Basic, Some(meta)) => meta,
            (_, Some(meta)) => format!("{meta} {body_text}"),
            (_, None) => body_text,
        };
        let summarization = ctx.summarize(&summary_input, language.as_ref());
        summary.description = summarization.description;
        summary.word_cloud = summarization.word_cloud;
        if summary.description.trim().is_empty() {
            summary.description = truncate_chars(&crude_body_text(&source), config.max_description_len);
        }
        summary.language = language;

        summary.links = document_links(&doc, &source, url, ctx);

        if let Some(target) = refresh_redirect(&doc, url, ctx).or_else(|| canonical_redirect(&doc, url, ctx)) {
            apply_redirect(&mut summary, target, ctx);
        }

        let nothing_found = summary.title.is_empty()
            && summary.description.trim().is_empty()
            && summary.links.is_empty()
            && summary.location_redirect.is_none();
        if nothing_found {
            tracing::debug!(url = %url, "HTML yielded nothing, falling back to plain text");
            backfill_from_text(&mut summary, &strip_tags(raw), ctx);
        }

        summary
    }

    /// Outgoing links of decoded markup, without summarizing its text.
    pub fn extract_links(&self, raw: &str, url: &Url, ctx: &ExtractionContext) -> IndexMap<Url, String> {
        let source = clean_html(raw);
        let doc = Html::parse_document(&source);
        document_links(&doc, &source, url, ctx)
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for HtmlExtractor {
    fn name(&self) -> &str {
        "html-extractor"
    }

    fn description(&self) -> &str {
        "Extracts title, description, links and redirects from HTML pages"
    }
}

impl DocumentExtractor for HtmlExtractor {
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
        let charset = sniff_charset(content);
        let html = decode_text(content, charset.as_deref());
        Ok(self.extract_html(&html, url, ctx, charset.as_deref()))
    }

    fn supported_mime_types(&self) -> &[&str] {
        &["text/html", "application/xhtml+xml"]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["html", "htm", "xhtml", "shtml", "php", "asp", "aspx", "jsp"]
    }

    fn supported_root_elements(&self) -> &[&str] {
        &["html"]
    }

    fn priority(&self) -> i32 {
        60
    }
}

fn document_links(doc: &Html, source: &str, url: &Url, ctx: &ExtractionContext) -> IndexMap<Url, String> {
    let mut links = ctx.link_collector(url);
    if let Some(base) = doc
        .select(&BASE)
        .filter_map(|e| e.value().attr("href"))
        .find_map(|href| ctx.url_resolver().canonicalize(href, url))
    {
        links.set_base(base);
    }
    for anchor in doc.select(&ANCHORS) {
        if is_nofollow(anchor) {
            continue;
        }
        if let Some(href) = anchor.value().attr("href") {
            links.add(href, &element_text(anchor));
        }
    }
    for frame in doc.select(&FRAMES) {
        if let Some(src) = frame.value().attr("src") {
            links.add(src, "");
        }
    }
    for image in doc.select(&ALT_IMAGES) {
        if let (Some(src), Some(alt)) = (image.value().attr("src"), image.value().attr("alt")) {
            links.add(src, alt);
        }
    }
    if links.is_empty() {
        collect_http_links(source, &mut links);
    }
    links.into_links()
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn named_meta(doc: &Html, name: &str) -> Option<String> {
    doc.select(&NAMED_META)
        .filter(|e| e.value().attr("name").is_some_and(|n| n.trim().eq_ignore_ascii_case(name)))
        .filter_map(|e| e.value().attr("content"))
        .map(collapse_whitespace)
        .find(|content| !content.is_empty())
}

fn http_equiv_meta<'a>(doc: &'a Html, equiv: &str) -> Option<&'a str> {
    doc.select(&HTTP_EQUIV_META)
        .find(|e| {
            e.value()
                .attr("http-equiv")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(equiv))
        })
        .and_then(|e| e.value().attr("content"))
}

fn robot_directives(doc: &Html) -> std::collections::BTreeSet<String> {
    doc.select(&NAMED_META)
        .filter(|e| {
            e.value()
                .attr("name")
                .is_some_and(|n| n.to_ascii_uppercase().contains("ROBOT"))
        })
        .filter_map(|e| e.value().attr("content"))
        .flat_map(|content| content.split(','))
        .map(|directive| directive.trim().to_ascii_uppercase())
        .filter(|directive| !directive.is_empty())
        .collect()
}

fn page_title(doc: &Html, raw: &str, max_len: usize) -> String {
    if let Some(title) = doc
        .select(&TITLE)
        .map(element_text)
        .find(|title| !title.is_empty())
    {
        return title;
    }

    let mut headings = String::new();
    for heading in doc.select(&HEADINGS).map(element_text).filter(|h| !h.is_empty()) {
        if !headings.is_empty() {
            headings.push_str(HEADING_SEPARATOR);
        }
        headings.push_str(&heading);
        if headings.chars().count() >= max_len {
            break;
        }
    }
    if !headings.is_empty() {
        return headings;
    }

    crude_title(raw).unwrap_or_default()
}

fn page_language(doc: &Html, declared_charset: Option<&str>) -> Option<LanguageTag> {
    if let Some(tag) = doc
        .select(&HTML_LANG)
        .filter_map(|e| e.value().attr("lang"))
        .find_map(LanguageTag::parse)
    {
        return Some(tag);
    }

    if let Some(tag) = http_equiv_meta(doc, "content-language")
        .and_then(|content| content.split(',').find_map(LanguageTag::parse))
    {
        return Some(tag);
    }

    let charset = declared_charset
        .map(str::to_string)
        .or_else(|| {
            doc.select(&CHARSET_META)
                .filter_map(|e| e.value().attr("charset"))
                .map(|c| c.trim().to_ascii_lowercase())
                .find(|c| !c.is_empty())
        })
        .or_else(|| http_equiv_meta(doc, "content-type").and_then(charset_from_content_type))?;
    language_from_charset(&charset)
}

fn is_nofollow(anchor: ElementRef<'_>) -> bool {
    anchor
        .value()
        .attr("rel")
        .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("nofollow")))
}

/// Target of a `refresh` (`5; url=...`) or `location` meta tag.
fn refresh_redirect(doc: &Html, url: &Url, ctx: &ExtractionContext) -> Option<Url> {
    let raw_target = http_equiv_meta(doc, "refresh")
        .and_then(refresh_target)
        .or_else(|| http_equiv_meta(doc, "location").map(str::trim))?;

    let target = ctx.url_resolver().canonicalize(raw_target, url)?;
    (target != *url && target.as_str().len() >= MIN_REDIRECT_URL_LEN).then_some(target)
}

/// URL part of a refresh directive such as `0;URL='https://example.com/'`.
fn refresh_target(content: &str) -> Option<&str> {
    let (_, rest) = content.split_once(';')?;
    let rest = rest.trim();
    let value = match rest.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("url=") => &rest[4..],
        _ => rest,
    };
    let value = value.trim().trim_matches(['\'', '"']).trim();
    (!value.is_empty()).then_some(value)
}

fn canonical_redirect(doc: &Html, url: &Url, ctx: &ExtractionContext) -> Option<Url> {
    let href = doc
        .select(&CANONICAL)
        .find(|e| {
            e.value()
                .attr("rel")
                .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("canonical")))
        })
        .and_then(|e| e.value().attr("href"))?;

    let target = ctx.url_resolver().canonicalize(href, url)?;
    let distance = levenshtein(&normalize_for_comparison(&target), &normalize_for_comparison(url));
    (distance >= MIN_CANONICAL_DISTANCE && target.as_str().len() >= MIN_REDIRECT_URL_LEN).then_some(target)
}

/// Lower-cased URL without scheme, `www.` prefix or trailing slash.
fn normalize_for_comparison(url: &Url) -> String {
    let lower = url.as_str().to_ascii_lowercase();
    let without_scheme = lower.split_once("://").map(|(_, rest)| rest).unwrap_or(&lower);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    without_www.trim_end_matches('/').to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Collapse the links to the redirect target and fill empty fields.
fn apply_redirect(summary: &mut Summary, target: Url, ctx: &ExtractionContext) {
    let mut links = ctx.link_collector(&summary.url);
    let original = summary.url.to_string();
    if !links.add_url(target.clone(), &format!("location:{original}")) {
        tracing::debug!(target = %target, "Redirect target rejected by the link collector");
        return;
    }

    if summary.title.trim().is_empty() {
        summary.title = truncate_chars(&original, ctx.config().max_title_len);
    }
    if summary.description.trim().is_empty() {
        summary.description = truncate_chars(target.as_str(), ctx.config().max_description_len);
    }
    summary.links = links.into_links();
    summary.location_redirect = Some(target);
}
