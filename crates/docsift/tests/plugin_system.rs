//! Custom extractors and indexing plugins on a caller-built registry.

use docsift::extractors::register_default_extractors;
use docsift::language_detection::LanguageGuesser;
use docsift::links::{DefaultUrlResolver, UrlResolver};
use docsift::plugins::ProcessingStage;
use docsift::types::{LanguageTag, RenderedContent, SubDoc};
use docsift::{
    DocumentExtractor, ExtractionConfig, ExtractionContext, FormatRegistry, IndexingPlugin, Plugin, Result, Summary,
    dispatch,
};
use std::sync::Arc;
use url::Url;

/// Summarizes `text/x-ini` files by their section headers.
struct IniExtractor;

impl Plugin for IniExtractor {
    fn name(&self) -> &str {
        "ini-extractor"
    }
}

impl DocumentExtractor for IniExtractor {
    fn extract(&self, content: &[u8], url: &Url, _ctx: &ExtractionContext) -> Result<Summary> {
        let text = String::from_utf8_lossy(content);
        let sections: Vec<&str> = text
            .lines()
            .filter_map(|line| line.trim().strip_prefix('[')?.strip_suffix(']'))
            .collect();
        let mut summary = Summary::new(url, "text/x-ini", RenderedContent::html(format!("<pre>{text}</pre>")));
        summary.description = sections.join(" ");
        Ok(summary)
    }

    fn supported_mime_types(&self) -> &[&str] {
        &["text/x-ini"]
    }

    fn supported_extensions(&self) -> &[&str] {
        &["ini"]
    }
}

/// One sub-document per `[section]`.
struct SectionSplitter;

impl Plugin for SectionSplitter {
    fn name(&self) -> &str {
        "section-splitter"
    }
}

impl IndexingPlugin for SectionSplitter {
    fn process_page(&self, content: &[u8], url: &Url) -> Result<Vec<SubDoc>> {
        Ok(String::from_utf8_lossy(content)
            .lines()
            .filter_map(|line| line.trim().strip_prefix('[')?.strip_suffix(']').map(str::to_string))
            .map(|section| {
                let mut sub_url = url.clone();
                sub_url.set_fragment(Some(&section));
                SubDoc {
                    url: sub_url,
                    title: section,
                    description: String::new(),
                    mime_type: "text/x-ini".to_string(),
                }
            })
            .collect())
    }

    fn process_summary(&self, summary: &mut Summary, _url: &Url) -> Result<()> {
        summary.title = format!("{} sections", summary.sub_documents.len());
        Ok(())
    }

    fn processing_stage(&self) -> ProcessingStage {
        ProcessingStage::Late
    }
}

fn registry() -> FormatRegistry {
    let mut builder = FormatRegistry::builder();
    register_default_extractors(&mut builder).unwrap();
    builder.register(Arc::new(IniExtractor)).unwrap();
    builder.register_plugin(Arc::new(SectionSplitter)).unwrap();
    builder.build()
}

#[test]
fn test_custom_extractor_and_plugin() {
    let registry = registry();
    let ctx = ExtractionContext::new(ExtractionConfig::default());
    let url = Url::parse("https://example.com/settings.ini").unwrap();
    let summary = dispatch(&registry, b"[server]\nport=80\n[client]\nretries=3\n", "", &url, &ctx).unwrap();

    assert_eq!(summary.mime_type, "text/x-ini");
    assert_eq!(summary.description, "server client");
    assert_eq!(summary.sub_documents.len(), 2);
    assert_eq!(summary.sub_documents[1].url.fragment(), Some("client"));
    assert_eq!(summary.title, "2 sections");
}

#[test]
fn test_plugins_run_for_builtin_formats_too() {
    let registry = registry();
    let ctx = ExtractionContext::default();
    let url = Url::parse("https://example.com/page.html").unwrap();
    let summary = dispatch(&registry, b"<title>Plain page</title>", "text/html", &url, &ctx).unwrap();
    assert!(summary.sub_documents.is_empty());
    assert_eq!(summary.title, "0 sections");
}

#[test]
fn test_registry_lists_custom_extractor() {
    let registry = registry();
    assert!(registry.get_by_name("ini-extractor").is_some());
    assert!(registry.is_indexed_extension("ini"));
    assert!(registry.supported_mime_types().iter().any(|m| m == "text/x-ini"));
    registry.shutdown_all().unwrap();
}

/// Keeps only links on the crawl's own host.
struct SameHostResolver;

impl UrlResolver for SameHostResolver {
    fn canonicalize(&self, raw: &str, base: &Url) -> Option<Url> {
        DefaultUrlResolver
            .canonicalize(raw, base)
            .filter(|url| url.host_str() == base.host_str())
    }

    fn is_recursive(&self, url: &Url) -> bool {
        DefaultUrlResolver.is_recursive(url)
    }
}

struct FixedLanguage;

impl LanguageGuesser for FixedLanguage {
    fn guess(&self, _sample: &str, _hint_url: Option<&Url>) -> Option<LanguageTag> {
        LanguageTag::parse("nl")
    }
}

#[test]
fn test_custom_collaborators() {
    let registry = registry();
    let ctx = ExtractionContext::new(ExtractionConfig::default())
        .with_url_resolver(Arc::new(SameHostResolver))
        .with_language_guesser(Arc::new(FixedLanguage));
    let url = Url::parse("https://site.example/index.html").unwrap();
    let html = br#"<html><body><p>Tekst zonder taalattribuut.</p>
<a href="/local">local</a><a href="https://other.example/">other</a></body></html>"#;
    let summary = dispatch(&registry, html, "text/html", &url, &ctx).unwrap();

    let links: Vec<&str> = summary.links.keys().map(Url::as_str).collect();
    assert_eq!(links, vec!["https://site.example/local"]);
    assert_eq!(summary.language.as_ref().map(|l| l.as_str()), Some("nl"));
}
