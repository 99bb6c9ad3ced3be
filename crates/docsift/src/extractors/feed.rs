//! RSS, RDF and Atom feed extractor.

use crate::core::context::ExtractionContext;
use crate::core::mime::{ATOM_MIME_TYPE, RDF_MIME_TYPE, RSS_MIME_TYPE};
use crate::error::Result;
use crate::extraction::html::strip_tags;
use crate::extraction::text::summarize_text;
use crate::extraction::xml::{decode_xml, node_text, parse_document};
use crate::links::LinkCollector;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::text::{push_capped, truncate_chars};
use crate::types::{LanguageTag, RenderedContent, Summary};
use roxmltree::Node;
use url::Url;

pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// Channel elements joined into an RSS description, in order.
const RSS_DESCRIPTION_FIELDS: &[&str] = &["description", "category", "pubDate", "lastBuildDate", "copyright"];

/// Feed elements joined into an Atom description, in order.
const ATOM_DESCRIPTION_FIELDS: &[&str] = &["subtitle", "updated", "rights", "generator"];

/// Feed extractor for RSS 0.9x/2.0, RSS 1.0 (RDF) and Atom.
///
/// Feeds that fail to parse are summarized as plain text with the markup
/// stripped.
pub struct FeedExtractor;

impl FeedExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FeedExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for FeedExtractor {
    fn name(&self) -> &str {
        "feed-extractor"
    }

    fn description(&self) -> &str {
        "Extracts channel metadata and item links from RSS and Atom feeds"
    }
}

impl DocumentExtractor for FeedExtractor {
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
        let xml = decode_xml(content);
        let doc = match parse_document(&xml) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Malformed feed, summarizing as text");
                return Ok(summarize_text(&strip_tags(&xml), url, ctx, RSS_MIME_TYPE));
            }
        };

        let root = doc.root_element();
        let mut summary = if root.tag_name().name().eq_ignore_ascii_case("feed") {
            atom_summary(root, url, ctx)
        } else {
            rss_summary(root, url, ctx)
        };
        summary.body = RenderedContent::xml(xml.clone());
        Ok(summary)
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[RSS_MIME_TYPE, ATOM_MIME_TYPE, RDF_MIME_TYPE]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["rss", "atom"]
    }

    fn supported_root_elements(&self) -> &[&str] {
        &["rss", "rdf", "feed", "rdf:rdf"]
    }
}

fn is_named(node: Node<'_, '_>, name: &str, namespace: Option<&str>) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && (namespace.is_none() || node.tag_name().namespace() == namespace)
}

/// First child element with the given local name, restricted to `namespace`
/// when one is given.
fn child<'a, 'input>(node: Node<'a, 'input>, name: &str, namespace: Option<&str>) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_named(*n, name, namespace))
}

fn children<'a, 'input, 'n>(
    node: Node<'a, 'input>,
    name: &'n str,
    namespace: Option<&'n str>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| is_named(*n, name, namespace))
}

fn child_text(node: Node<'_, '_>, name: &str, namespace: Option<&str>) -> String {
    child(node, name, namespace).map(node_text).unwrap_or_default()
}

/// Target of a `<link>` element: its text, or its `href` for Atom style links.
fn link_target(link: Node<'_, '_>) -> String {
    let text = node_text(link);
    if text.is_empty() {
        link.attribute("href").unwrap_or_default().trim().to_string()
    } else {
        text
    }
}

fn finish(
    mut summary: Summary,
    title: &str,
    description: String,
    declared_language: Option<&str>,
    links: LinkCollector<'_>,
    ctx: &ExtractionContext,
) -> Summary {
    summary.title = truncate_chars(title, ctx.config().max_title_len);
    summary.language = declared_language.and_then(LanguageTag::parse).or_else(|| {
        let sample = format!("{title} {description}");
        ctx.guess_language(&sample, Some(&summary.url))
    });
    summary.description = description;
    summary.links = links.into_links();
    summary
}

fn rss_summary(root: Node<'_, '_>, url: &Url, ctx: &ExtractionContext) -> Summary {
    let max_len = ctx.config().max_description_len;
    let summary = Summary::new(url, RSS_MIME_TYPE, RenderedContent::xml(""));
    let mut links = ctx.link_collector(url);

    let channel = root
        .descendants()
        .find(|n| n.has_tag_name("channel"))
        .unwrap_or(root);
    let title = child_text(channel, "title", None);

    let mut description = String::new();
    for field in RSS_DESCRIPTION_FIELDS {
        for element in children(channel, field, None) {
            push_capped(&mut description, &node_text(element), max_len);
        }
    }

    for link in children(channel, "link", None) {
        links.add(&link_target(link), &title);
    }
    if let Some(image_link) = child(channel, "image", None).and_then(|image| child(image, "link", None)) {
        links.add(&link_target(image_link), "");
    }

    // RSS 1.0 puts items next to the channel rather than inside it.
    let mut item_titles = Vec::new();
    for item in root.descendants().filter(|n| n.has_tag_name("item")) {
        let item_title = child_text(item, "title", None);
        if let Some(link) = child(item, "link", None) {
            links.add(&link_target(link), &item_title);
        }
        if links.is_full() {
            break;
        }
        item_titles.push(item_title);
    }
    if description.is_empty() {
        for item_title in &item_titles {
            if !push_capped(&mut description, item_title, max_len) {
                break;
            }
        }
    }

    let language = child_text(channel, "language", None);
    tracing::debug!(url = %url, items = item_titles.len(), "RSS feed parsed");
    finish(summary, &title, description, Some(language.as_str()), links, ctx)
}

fn atom_summary(root: Node<'_, '_>, url: &Url, ctx: &ExtractionContext) -> Summary {
    let max_len = ctx.config().max_description_len;
    let ns = root.tag_name().namespace().filter(|ns| *ns == ATOM_NAMESPACE);
    let mut summary = Summary::new(url, ATOM_MIME_TYPE, RenderedContent::xml(""));
    let mut links = ctx.link_collector(url);

    let title = child_text(root, "title", ns);
    let feed_author = child(root, "author", ns).map(|author| child_text(author, "name", ns));

    let mut description = String::new();
    push_capped(&mut description, &child_text(root, ATOM_DESCRIPTION_FIELDS[0], ns), max_len);
    if let Some(author) = &feed_author {
        push_capped(&mut description, author, max_len);
    }
    for field in &ATOM_DESCRIPTION_FIELDS[1..] {
        push_capped(&mut description, &child_text(root, field, ns), max_len);
    }

    for link in children(root, "link", ns) {
        links.add(&link_target(link), &title);
    }

    let mut authors: Vec<String> = feed_author.into_iter().filter(|a| !a.is_empty()).collect();
    let mut entries = 0usize;
    for entry in children(root, "entry", ns) {
        entries += 1;
        let entry_title = child_text(entry, "title", ns);
        for link in children(entry, "link", ns) {
            links.add(&link_target(link), &entry_title);
        }
        for author in children(entry, "author", ns) {
            let name = child_text(author, "name", ns);
            if !name.is_empty() && !authors.contains(&name) {
                authors.push(name);
            }
        }
    }
    summary.authors = authors;

    let language = root
        .attributes()
        .find(|attr| attr.name() == "lang")
        .map(|attr| attr.value().to_string());
    tracing::debug!(url = %url, entries, "Atom feed parsed");
    finish(summary, &title, description, language.as_deref(), links, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(xml: &str) -> Summary {
        let url = Url::parse("https://news.example/feed").unwrap();
        FeedExtractor::new()
            .extract(xml.as_bytes(), &url, &ExtractionContext::default())
            .unwrap()
    }

    #[test]
    fn test_rss_feed() {
        let summary = extract(
            r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Example News</title>
  <link>https://news.example/</link>
  <description>Daily headlines</description>
  <category>World</category>
  <language>en-us</language>
  <copyright>Example Corp</copyright>
  <image><url>https://news.example/logo.png</url><link>https://news.example/about</link></image>
  <item><title>First story</title><link>https://news.example/1</link></item>
  <item><title>Second story</title><link>https://news.example/2</link></item>
  <item><title>Duplicate</title><link>https://news.example/1</link></item>
</channel></rss>"#,
        );

        assert_eq!(summary.title, "Example News");
        assert_eq!(summary.description, "Daily headlines World Example Corp");
        assert_eq!(summary.language.as_ref().map(|l| l.as_str()), Some("en"));
        assert_eq!(summary.links.len(), 4);
        let first = Url::parse("https://news.example/1").unwrap();
        assert_eq!(summary.links.get(&first).map(String::as_str), Some("First story Duplicate"));
        assert_eq!(summary.body.mime_type, "application/xml");
    }

    #[test]
    fn test_rdf_items_outside_channel() {
        let summary = extract(
            r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
<channel><title>RDF Feed</title><link>https://rdf.example/</link></channel>
<item><title>Entry</title><link>https://rdf.example/entry</link></item>
</rdf:RDF>"#,
        );
        assert_eq!(summary.title, "RDF Feed");
        assert_eq!(summary.description, "Entry");
        assert!(summary.links.contains_key(&Url::parse("https://rdf.example/entry").unwrap()));
    }

    #[test]
    fn test_atom_feed() {
        let summary = extract(
            r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="en">
  <title>Atom Blog</title>
  <subtitle>Notes on things</subtitle>
  <link href="https://blog.example/"/>
  <updated>2024-01-01T00:00:00Z</updated>
  <author><name>Sam Writer</name></author>
  <entry>
    <title>Hello Atom</title>
    <link rel="alternate" href="https://blog.example/hello"/>
    <author><name>Guest</name></author>
  </entry>
</feed>"#,
        );

        assert_eq!(summary.mime_type, ATOM_MIME_TYPE);
        assert_eq!(summary.title, "Atom Blog");
        assert_eq!(summary.description, "Notes on things Sam Writer 2024-01-01T00:00:00Z");
        assert_eq!(summary.authors, vec!["Sam Writer".to_string(), "Guest".to_string()]);
        let hello = Url::parse("https://blog.example/hello").unwrap();
        assert_eq!(summary.links.get(&hello).map(String::as_str), Some("Hello Atom"));
        assert_eq!(summary.language.as_ref().map(|l| l.as_str()), Some("en"));
    }

    #[test]
    fn test_malformed_feed_falls_back_to_text() {
        let summary = extract("<rss><channel><title>Broken https://news.example/x</title>");
        assert_eq!(summary.mime_type, RSS_MIME_TYPE);
        assert!(summary.description.contains("Broken"));
        assert!(summary.links.contains_key(&Url::parse("https://news.example/x").unwrap()));
    }
}
