//! Document extractor plugin trait.
//!
//! Extractors are self-describing: the registry learns which MIME types, URL
//! extensions and XML root elements an extractor owns by asking it.

use crate::Result;
use crate::core::context::ExtractionContext;
use crate::plugins::Plugin;
use crate::types::Summary;
use url::Url;

/// Trait for format-specific extractors.
///
/// `extract` is synchronous and CPU-bound. Implementations should degrade to a
/// partial summary on malformed input; an `Err` makes the dispatcher fall back
/// to the plain-text extractor on the same bytes.
///
/// # Example
///
/// ```rust
/// use docsift::core::context::ExtractionContext;
/// use docsift::extraction::text::summarize_text;
/// use docsift::plugins::{DocumentExtractor, Plugin};
/// use docsift::{Result, Summary};
/// use url::Url;
///
/// struct IniExtractor;
///
/// impl Plugin for IniExtractor {
///     fn name(&self) -> &str { "ini-extractor" }
/// }
///
/// impl DocumentExtractor for IniExtractor {
///     fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
///         let text = String::from_utf8_lossy(content);
///         Ok(summarize_text(&text, url, ctx, "text/x-ini"))
///     }
///
///     fn supported_mime_types(&self) -> &[&str] {
///         &["text/x-ini"]
///     }
///
///     fn supported_extensions(&self) -> &[&str] {
///         &["ini"]
///     }
/// }
/// ```
pub trait DocumentExtractor: Plugin {
    /// Produce a summary for `content` fetched from `url`.
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary>;

    /// MIME types this extractor owns. A `type/*` entry matches by prefix.
    fn supported_mime_types(&self) -> &[&str];

    /// URL path extensions (lower-case, no dot) this extractor indexes.
    fn supported_extensions(&self) -> &[&str] {
        &[]
    }

    /// Root element names routed here when a document is declared as generic XML.
    fn supported_root_elements(&self) -> &[&str] {
        &[]
    }

    /// True for raster/vector image formats.
    fn is_image_format(&self) -> bool {
        false
    }

    /// Higher priority wins when several extractors claim the same MIME type.
    fn priority(&self) -> i32 {
        50
    }
}
