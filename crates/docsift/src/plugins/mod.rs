//! Plugin system.
//!
//! - [`DocumentExtractor`]: format-specific extraction, selected by MIME type,
//!   URL extension or XML root element
//! - [`IndexingPlugin`]: post-extraction hooks appending sub-documents
//! - [`registry`]: the immutable [`FormatRegistry`] built from both

mod extractor;
mod processor;
pub mod registry;
mod traits;

pub use extractor::DocumentExtractor;
pub use processor::{IndexingPlugin, ProcessingStage};
pub use registry::{FormatRegistry, FormatRegistryBuilder, get_format_registry};
pub use traits::Plugin;
