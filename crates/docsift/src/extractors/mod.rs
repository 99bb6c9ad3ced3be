//! Built-in document extractors.
//!
//! Every extractor implements [`DocumentExtractor`](crate::plugins::DocumentExtractor)
//! and is registered by [`register_default_extractors`]. Format-level
//! parsing lives in [`crate::extraction`]; the types here only assemble
//! summaries.

use crate::Result;
use crate::plugins::registry::FormatRegistryBuilder;
use std::sync::Arc;

mod office;

pub mod docx;
pub mod epub;
pub mod feed;
pub mod gopher;
pub mod html;
pub mod image;
pub mod pdf;
pub mod pptx;
pub mod sitemap;
pub mod text;
pub mod xlsx;

pub use docx::DocxExtractor;
pub use epub::EpubExtractor;
pub use feed::FeedExtractor;
pub use gopher::GopherExtractor;
pub use html::HtmlExtractor;
pub use image::{BmpExtractor, RasterImageExtractor, SvgExtractor};
pub use pdf::PdfExtractor;
pub use pptx::PptxExtractor;
pub use sitemap::SitemapExtractor;
pub use text::PlainTextExtractor;
pub use xlsx::XlsxExtractor;

/// Register all built-in extractors with `builder`.
///
/// Registering twice is harmless: duplicate names are ignored by the builder.
///
/// # Example
///
/// ```rust
/// use docsift::extractors::register_default_extractors;
/// use docsift::plugins::registry::FormatRegistryBuilder;
///
/// # fn main() -> docsift::Result<()> {
/// let mut builder = FormatRegistryBuilder::new();
/// register_default_extractors(&mut builder)?;
/// let registry = builder.build();
/// assert!(registry.get_by_root_element("urlset").is_some());
/// # Ok(())
/// # }
/// ```
pub fn register_default_extractors(builder: &mut FormatRegistryBuilder) -> Result<()> {
    builder.register(Arc::new(PlainTextExtractor::new()))?;
    builder.register(Arc::new(HtmlExtractor::new()))?;
    builder.register(Arc::new(FeedExtractor::new()))?;
    builder.register(Arc::new(SitemapExtractor::new()))?;
    builder.register(Arc::new(GopherExtractor::new()))?;
    builder.register(Arc::new(PdfExtractor::new()))?;
    builder.register(Arc::new(DocxExtractor::new()))?;
    builder.register(Arc::new(PptxExtractor::new()))?;
    builder.register(Arc::new(XlsxExtractor::new()))?;
    builder.register(Arc::new(EpubExtractor::new()))?;
    builder.register(Arc::new(BmpExtractor::new()))?;
    builder.register(Arc::new(RasterImageExtractor::new()))?;
    builder.register(Arc::new(SvgExtractor::new()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_default_extractors() {
        let mut builder = FormatRegistryBuilder::new();
        register_default_extractors(&mut builder).expect("Failed to register extractors");
        let registry = builder.build();
        let names = registry.list();

        for expected in [
            "plain-text-extractor",
            "html-extractor",
            "feed-extractor",
            "sitemap-extractor",
            "gopher-extractor",
            "pdf-extractor",
            "docx-extractor",
            "pptx-extractor",
            "xlsx-extractor",
            "epub-extractor",
            "bmp-extractor",
            "raster-image-extractor",
            "svg-extractor",
        ] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }
        assert_eq!(names.len(), 13);
    }

    #[test]
    fn test_registration_is_idempotent() {
        let mut builder = FormatRegistryBuilder::new();
        register_default_extractors(&mut builder).unwrap();
        register_default_extractors(&mut builder).unwrap();
        assert_eq!(builder.len(), 13);
    }

    #[test]
    fn test_default_lookup_tables() {
        let mut builder = FormatRegistryBuilder::new();
        register_default_extractors(&mut builder).unwrap();
        let registry = builder.build();

        let by_root = |root: &str| registry.get_by_root_element(root).map(|e| e.name().to_string());
        assert_eq!(by_root("rss").as_deref(), Some("feed-extractor"));
        assert_eq!(by_root("rdf:rdf").as_deref(), Some("feed-extractor"));
        assert_eq!(by_root("urlset").as_deref(), Some("sitemap-extractor"));
        assert_eq!(by_root("svg").as_deref(), Some("svg-extractor"));
        assert_eq!(by_root("html").as_deref(), Some("html-extractor"));

        assert_eq!(
            registry.get("text/html").map(|e| e.name().to_string()).as_deref(),
            Some("html-extractor")
        );
        assert_eq!(
            registry.get_by_extension("docx").map(|e| e.name().to_string()).as_deref(),
            Some("docx-extractor")
        );
        assert!(registry.is_image_extension("bmp"));
        assert!(registry.is_indexed_extension("pdf"));
    }
}
