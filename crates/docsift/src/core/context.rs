//! Per-run extraction context: configuration plus collaborators.

use crate::core::config::ExtractionConfig;
use crate::language_detection::{DefaultLanguageGuesser, LanguageGuesser};
use crate::links::{DefaultUrlResolver, LinkCollector, UrlResolver};
use crate::text::summarizer::{StrategySummarizer, Summarization, Summarizer};
use crate::types::LanguageTag;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Everything an extractor needs besides the document bytes.
///
/// Cloning is cheap: collaborators are shared behind `Arc`.
///
/// # Example
///
/// ```rust
/// use docsift::core::config::{ExtractionConfig, SummarizerStrategy};
/// use docsift::core::context::ExtractionContext;
///
/// let config = ExtractionConfig {
///     summarizer_strategy: SummarizerStrategy::Centroid,
///     ..Default::default()
/// };
/// let ctx = ExtractionContext::new(config);
/// assert_eq!(ctx.config().summarizer_strategy, SummarizerStrategy::Centroid);
/// ```
#[derive(Clone)]
pub struct ExtractionContext {
    config: ExtractionConfig,
    resolver: Arc<dyn UrlResolver>,
    guesser: Arc<dyn LanguageGuesser>,
    summarizer: Arc<dyn Summarizer>,
}

impl ExtractionContext {
    /// Context with the default collaborators for `config`.
    pub fn new(config: ExtractionConfig) -> Self {
        let guesser = DefaultLanguageGuesser::new(config.language_detection.clone());
        let summarizer = StrategySummarizer::new(config.summarizer_strategy);
        Self {
            config,
            resolver: Arc::new(DefaultUrlResolver),
            guesser: Arc::new(guesser),
            summarizer: Arc::new(summarizer),
        }
    }

    pub fn with_url_resolver(mut self, resolver: Arc<dyn UrlResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_language_guesser(mut self, guesser: Arc<dyn LanguageGuesser>) -> Self {
        self.guesser = guesser;
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn url_resolver(&self) -> &dyn UrlResolver {
        self.resolver.as_ref()
    }

    /// Link collector bounded by `max_links_per_document`.
    pub fn link_collector(&self, base: &Url) -> LinkCollector<'_> {
        LinkCollector::new(
            base,
            self.resolver.as_ref(),
            self.config.max_links_per_document,
            self.config.max_url_length,
        )
    }

    /// Link collector bounded by `max_links_per_sitemap`.
    pub fn sitemap_link_collector(&self, base: &Url) -> LinkCollector<'_> {
        LinkCollector::new(
            base,
            self.resolver.as_ref(),
            self.config.max_links_per_sitemap,
            self.config.max_url_length,
        )
    }

    pub fn guess_language(&self, sample: &str, hint_url: Option<&Url>) -> Option<LanguageTag> {
        self.guesser.guess(sample, hint_url)
    }

    /// Summarize `text` within `max_description_len`.
    pub fn summarize(&self, text: &str, language: Option<&LanguageTag>) -> Summarization {
        let mut summary = self
            .summarizer
            .summarize(text, language, self.config.max_description_len);
        if summary.description.chars().count() > self.config.max_description_len {
            summary.description =
                crate::text::truncate_chars(&summary.description, self.config.max_description_len);
        }
        summary
    }
}

impl Default for ExtractionContext {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl fmt::Debug for ExtractionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
