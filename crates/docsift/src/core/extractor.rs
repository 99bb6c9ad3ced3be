//! Main extraction entry points.
//!
//! - [`dispatch`] - run one document through a given registry and context
//! - [`extract_bytes`] - same, against the global registry with default collaborators
//! - [`batch_extract_bytes`] - many documents concurrently on the blocking pool
//!
//! Extraction never fails from the caller's point of view: an extractor that
//! errors or panics is replaced by the plain-text extractor on the same
//! bytes, and only input that is not even text yields `None`.

use crate::core::config::ExtractionConfig;
use crate::core::context::ExtractionContext;
use crate::core::mime::{OCTET_STREAM_MIME_TYPE, extension_from_url, is_generic_xml, normalize_mime_type};
use crate::extraction::html::extract_panic_reason;
use crate::extraction::xml::sniff_root_element;
use crate::plugins::DocumentExtractor;
use crate::plugins::registry::{FormatRegistry, get_format_registry};
use crate::types::Summary;
use crate::{DocsiftError, Result};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use url::Url;

/// Pick the extractor for a normalized MIME type.
///
/// Generic XML is routed by its root element; an unknown or missing MIME
/// type falls back to the URL extension, then to plain text.
pub fn select_extractor(registry: &FormatRegistry, content: &[u8], mime_type: &str, url: &Url) -> Arc<dyn DocumentExtractor> {
    if is_generic_xml(mime_type) {
        return sniff_root_element(content)
            .and_then(|root| {
                tracing::debug!(root = %root, "Dispatching generic XML by root element");
                registry.get_by_root_element(&root)
            })
            .unwrap_or_else(|| registry.plain_text());
    }

    if !mime_type.is_empty()
        && mime_type != OCTET_STREAM_MIME_TYPE
        && let Some(extractor) = registry.get(mime_type)
    {
        return extractor;
    }

    extension_from_url(url)
        .and_then(|extension| registry.get_by_extension(&extension))
        .unwrap_or_else(|| registry.plain_text())
}

/// Run `extractor`, turning a panic into an error.
fn run_guarded(extractor: &dyn DocumentExtractor, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
    match catch_unwind(AssertUnwindSafe(|| extractor.extract(content, url, ctx))) {
        Ok(result) => result,
        Err(panic) => Err(DocsiftError::Plugin {
            message: format!("extractor panicked: {}", extract_panic_reason(&panic)),
            plugin_name: extractor.name().to_string(),
        }),
    }
}

/// Extract a summary from raw bytes.
///
/// Errors and panics of the selected extractor are logged and the document
/// is re-run through plain text. Returns `None` only when plain text rejects
/// the bytes too. Registered indexing plugins run on every produced summary:
/// `process_page` results are appended to `sub_documents`, then
/// `process_summary` may adjust the summary.
#[tracing::instrument(skip_all, fields(url = %url, mime_type = %mime_type))]
pub fn dispatch(
    registry: &FormatRegistry,
    content: &[u8],
    mime_type: &str,
    url: &Url,
    ctx: &ExtractionContext,
) -> Option<Summary> {
    let mime_type = normalize_mime_type(mime_type);
    let extractor = select_extractor(registry, content, &mime_type, url);
    let plain_text = registry.plain_text();

    let result = match run_guarded(extractor.as_ref(), content, url, ctx) {
        Ok(summary) => Ok(summary),
        Err(e) if extractor.name() != plain_text.name() => {
            tracing::warn!(extractor = extractor.name(), error = %e, "Extraction failed, falling back to plain text");
            run_guarded(plain_text.as_ref(), content, url, ctx)
        }
        Err(e) => Err(e),
    };

    let mut summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            tracing::debug!(error = %e, "Document rejected");
            return None;
        }
    };

    run_plugins(registry, &mut summary, content, url);
    Some(summary)
}

fn run_plugins(registry: &FormatRegistry, summary: &mut Summary, content: &[u8], url: &Url) {
    for plugin in registry.plugins() {
        match plugin.process_page(content, url) {
            Ok(sub_documents) => summary.sub_documents.extend(sub_documents),
            Err(e) => tracing::warn!(plugin = plugin.name(), error = %e, "process_page failed"),
        }
    }
    for plugin in registry.plugins() {
        if let Err(e) = plugin.process_summary(summary, url) {
            tracing::warn!(plugin = plugin.name(), error = %e, "process_summary failed");
        }
    }
}

/// Extract a summary with the global registry and default collaborators.
///
/// # Example
///
/// ```rust
/// use docsift::{ExtractionConfig, extract_bytes};
/// use url::Url;
///
/// let url = Url::parse("https://example.com/notes.txt").unwrap();
/// let summary = extract_bytes(b"Meeting notes", "text/plain", &url, &ExtractionConfig::default()).unwrap();
/// assert_eq!(summary.description, "Meeting notes");
/// ```
pub fn extract_bytes(content: &[u8], mime_type: &str, url: &Url, config: &ExtractionConfig) -> Option<Summary> {
    let ctx = ExtractionContext::new(config.clone());
    dispatch(&get_format_registry(), content, mime_type, url, &ctx)
}

/// One input of [`batch_extract_bytes`].
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub content: Vec<u8>,
    pub mime_type: String,
    pub url: Url,
}

impl BatchItem {
    pub fn new(content: impl Into<Vec<u8>>, mime_type: impl Into<String>, url: Url) -> Self {
        Self {
            content: content.into(),
            mime_type: mime_type.into(),
            url,
        }
    }
}

/// Extract many documents concurrently.
///
/// Each document runs on tokio's blocking pool; at most
/// [`ExtractionConfig::concurrency_limit`] run at once. Results are in input
/// order.
///
/// # Errors
///
/// Only when a task cannot be joined (runtime shutdown).
#[cfg(feature = "tokio-runtime")]
#[tracing::instrument(skip_all, fields(batch_size = items.len()))]
pub async fn batch_extract_bytes(items: Vec<BatchItem>, config: &ExtractionConfig) -> Result<Vec<Option<Summary>>> {
    use tokio::sync::Semaphore;
    use tokio::task::JoinSet;

    if items.is_empty() {
        return Ok(vec![]);
    }

    let ctx = ExtractionContext::new(config.clone());
    let registry = get_format_registry();
    let semaphore = Arc::new(Semaphore::new(config.concurrency_limit()));
    let mut tasks = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let ctx = ctx.clone();
        let registry = Arc::clone(&registry);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| DocsiftError::Other(format!("Batch semaphore closed: {}", e)))?;
            let span = tracing::Span::current();
            let summary = tokio::task::spawn_blocking(move || {
                let _guard = span.entered();
                dispatch(&registry, &item.content, &item.mime_type, &item.url, &ctx)
            })
            .await
            .map_err(|e| DocsiftError::Other(format!("Extraction task failed: {}", e)))?;
            Ok::<_, DocsiftError>((index, summary))
        });
    }

    let mut results: Vec<Option<Summary>> = vec![None; tasks.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, summary) = joined.map_err(|e| DocsiftError::Other(format!("Task panicked: {}", e)))??;
        results[index] = summary;
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::registry::FormatRegistryBuilder;
    use crate::plugins::{IndexingPlugin, Plugin};
    use crate::types::{RenderedContent, SubDoc};

    struct PanickingExtractor;

    impl Plugin for PanickingExtractor {
        fn name(&self) -> &str {
            "panicking-extractor"
        }
    }

    impl DocumentExtractor for PanickingExtractor {
        fn extract(&self, _content: &[u8], _url: &Url, _ctx: &ExtractionContext) -> Result<Summary> {
            panic!("malformed input tripped an assertion");
        }

        fn supported_mime_types(&self) -> &[&str] {
            &["application/x-broken"]
        }
    }

    struct FailingExtractor;

    impl Plugin for FailingExtractor {
        fn name(&self) -> &str {
            "failing-extractor"
        }
    }

    impl DocumentExtractor for FailingExtractor {
        fn extract(&self, _content: &[u8], _url: &Url, _ctx: &ExtractionContext) -> Result<Summary> {
            Err(DocsiftError::parsing("bad header"))
        }

        fn supported_mime_types(&self) -> &[&str] {
            &["application/x-failing"]
        }
    }

    struct PageSplitter;

    impl Plugin for PageSplitter {
        fn name(&self) -> &str {
            "page-splitter"
        }
    }

    impl IndexingPlugin for PageSplitter {
        fn process_page(&self, _content: &[u8], url: &Url) -> Result<Vec<SubDoc>> {
            Ok(vec![SubDoc {
                url: url.join("#part-1").unwrap(),
                title: "Part 1".to_string(),
                description: String::new(),
                mime_type: "text/plain".to_string(),
            }])
        }

        fn process_summary(&self, summary: &mut Summary, _url: &Url) -> Result<()> {
            summary.title = format!("[{}]", summary.sub_documents.len());
            Ok(())
        }
    }

    fn registry_with(extractor: Arc<dyn DocumentExtractor>) -> FormatRegistry {
        let mut builder = FormatRegistryBuilder::new();
        crate::extractors::register_default_extractors(&mut builder).unwrap();
        builder.register(extractor).unwrap();
        builder.build()
    }

    fn url(path: &str) -> Url {
        Url::parse("https://example.com/").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_panic_falls_back_to_plain_text() {
        let registry = registry_with(Arc::new(PanickingExtractor));
        let summary = dispatch(
            &registry,
            b"still readable",
            "application/x-broken",
            &url("x"),
            &ExtractionContext::default(),
        )
        .unwrap();
        assert_eq!(summary.description, "still readable");
        assert_eq!(summary.mime_type, "text/plain");
    }

    #[test]
    fn test_error_falls_back_and_binary_gives_none() {
        let registry = registry_with(Arc::new(FailingExtractor));
        let ctx = ExtractionContext::default();

        let summary = dispatch(&registry, b"plain words", "application/x-failing", &url("x"), &ctx).unwrap();
        assert_eq!(summary.description, "plain words");

        assert!(dispatch(&registry, &[0u8, 1, 2, 3, 0, 0, 7], "application/x-failing", &url("x"), &ctx).is_none());
    }

    #[test]
    fn test_generic_xml_dispatches_by_root() {
        let registry = registry_with(Arc::new(FailingExtractor));
        let ctx = ExtractionContext::default();

        let sitemap = b"<?xml version=\"1.0\"?><urlset><url><loc>https://example.com/a</loc></url></urlset>";
        let summary = dispatch(&registry, sitemap, "text/xml; charset=utf-8", &url("sitemap.xml"), &ctx).unwrap();
        assert!(summary.just_metadata);
        assert_eq!(summary.links.len(), 1);

        let unknown = b"<inventory><item>bolt</item></inventory>";
        let summary = dispatch(&registry, unknown, "application/xml", &url("data.xml"), &ctx).unwrap();
        assert_eq!(summary.mime_type, "text/plain");
    }

    #[test]
    fn test_octet_stream_uses_url_extension() {
        let registry = registry_with(Arc::new(FailingExtractor));
        let extractor = select_extractor(&registry, b"", OCTET_STREAM_MIME_TYPE, &url("paper.pdf"));
        assert_eq!(extractor.name(), "pdf-extractor");

        let extractor = select_extractor(&registry, b"", "", &url("index.html"));
        assert_eq!(extractor.name(), "html-extractor");

        let extractor = select_extractor(&registry, b"", "", &url("noext"));
        assert_eq!(extractor.name(), "plain-text-extractor");
    }

    #[test]
    fn test_plugins_append_sub_documents() {
        let mut builder = FormatRegistryBuilder::new();
        crate::extractors::register_default_extractors(&mut builder).unwrap();
        builder.register_plugin(Arc::new(PageSplitter)).unwrap();
        let registry = builder.build();

        let summary = dispatch(&registry, b"text", "text/plain", &url("a.txt"), &ExtractionContext::default()).unwrap();
        assert_eq!(summary.sub_documents.len(), 1);
        assert_eq!(summary.sub_documents[0].title, "Part 1");
        assert_eq!(summary.title, "[1]");
    }

    #[test]
    fn test_extract_bytes_uses_global_registry() {
        let summary = extract_bytes(
            b"<html><head><title>Hi</title></head><body>x</body></html>",
            "text/html",
            &url("index.html"),
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert_eq!(summary.title, "Hi");
        assert!(!summary.body.content.is_empty());
    }

    #[test]
    fn test_body_is_set_for_every_summary() {
        let summary = extract_bytes(b"", "text/plain", &url("empty.txt"), &ExtractionConfig::default()).unwrap();
        assert_eq!(summary.body, RenderedContent::html("<html><body><pre></pre></body></html>"));
    }

    #[cfg(feature = "tokio-runtime")]
    #[tokio::test]
    async fn test_batch_extract_bytes_preserves_order() {
        let config = ExtractionConfig {
            max_concurrent_extractions: Some(2),
            ..Default::default()
        };
        let items: Vec<BatchItem> = (0..6)
            .map(|i| BatchItem::new(format!("document number {i}"), "text/plain", url(&format!("{i}.txt"))))
            .chain(std::iter::once(BatchItem::new(vec![0u8; 16], "application/octet-stream", url("blob"))))
            .collect();

        let results = batch_extract_bytes(items, &config).await.unwrap();
        assert_eq!(results.len(), 7);
        for (i, result) in results.iter().take(6).enumerate() {
            assert_eq!(result.as_ref().unwrap().description, format!("document number {i}"));
        }
        assert!(results[6].is_none());
    }

    #[cfg(feature = "tokio-runtime")]
    #[tokio::test]
    async fn test_batch_extract_bytes_empty() {
        let results = batch_extract_bytes(vec![], &ExtractionConfig::default()).await.unwrap();
        assert!(results.is_empty());
    }
}
