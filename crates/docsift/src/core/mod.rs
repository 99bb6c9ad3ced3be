//! Core extraction orchestration.
//!
//! - **Entry points**: [`dispatch`], [`extract_bytes`] and, with the
//!   `tokio-runtime` feature, [`batch_extract_bytes`]
//! - **MIME handling**: normalization, generic XML detection and URL extension lookup
//! - **Configuration**: [`ExtractionConfig`] loading and discovery
//! - **Context**: [`ExtractionContext`], the configuration plus replaceable collaborators
//!
//! # Example
//!
//! ```rust
//! use docsift::core::config::ExtractionConfig;
//! use docsift::core::extractor::extract_bytes;
//! use url::Url;
//!
//! let url = Url::parse("https://example.com/feed").unwrap();
//! let rss = b"<rss><channel><title>News</title><link>https://example.com/</link></channel></rss>";
//! let summary = extract_bytes(rss, "application/rss+xml", &url, &ExtractionConfig::default()).unwrap();
//! assert_eq!(summary.title, "News");
//! ```

pub mod config;
pub mod context;
pub mod extractor;
pub mod mime;

pub use config::{ExtractionConfig, LanguageDetectionConfig, PdfHeuristics, SummarizerStrategy};
pub use context::ExtractionContext;
#[cfg(feature = "tokio-runtime")]
pub use extractor::batch_extract_bytes;
pub use extractor::{BatchItem, dispatch, extract_bytes, select_extractor};
