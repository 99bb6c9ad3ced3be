//! docsift - document summaries for crawlers
//!
//! docsift turns raw, untrusted and often partially downloaded documents into
//! a uniform [`Summary`]: title, description, outbound links, language, a
//! renderable body and, for images, a thumbnail.
//!
//! # Quick Start
//!
//! ```rust
//! use docsift::{ExtractionConfig, extract_bytes};
//! use url::Url;
//!
//! let url = Url::parse("https://example.com/").unwrap();
//! let html = b"<html><head><title>Welcome</title></head><body><a href='/about'>About us</a></body></html>";
//! let summary = extract_bytes(html, "text/html; charset=utf-8", &url, &ExtractionConfig::default()).unwrap();
//!
//! assert_eq!(summary.title, "Welcome");
//! assert_eq!(summary.links.len(), 1);
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): dispatch, MIME handling, configuration, batch extraction
//! - **Plugins** (`plugins`): the [`DocumentExtractor`](plugins::DocumentExtractor)
//!   and [`IndexingPlugin`](plugins::IndexingPlugin) traits and the format registry
//! - **Extractors** (`extractors`): HTML, feeds, sitemaps, Gopher, PDF, Office
//!   Open XML, EPUB, images and plain text
//! - **Extraction** (`extraction`): format-level parsing shared by the extractors
//!
//! Malformed input degrades instead of failing: every extractor error falls
//! back to plain text, and only binary data that is not text at all produces
//! no summary.

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod extraction;
pub mod extractors;
pub mod language_detection;
pub mod links;
pub mod plugins;
pub mod text;
pub mod types;

pub use error::{DocsiftError, Result};
pub use types::*;

pub use core::config::{ExtractionConfig, LanguageDetectionConfig, PdfHeuristics, SummarizerStrategy};
pub use core::context::ExtractionContext;
#[cfg(feature = "tokio-runtime")]
pub use core::extractor::batch_extract_bytes;
pub use core::extractor::{BatchItem, dispatch, extract_bytes};

pub use plugins::registry::{FormatRegistry, FormatRegistryBuilder, get_format_registry};
pub use plugins::{DocumentExtractor, IndexingPlugin, Plugin};
