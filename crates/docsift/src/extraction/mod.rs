//! Format-level parsing primitives.
//!
//! The functions here work on bytes or strings and know nothing about the
//! registry; the extractors in [`crate::extractors`] combine them into
//! summaries.

pub mod bmp;
pub mod gopher;
pub mod html;
pub mod image;
pub mod office_metadata;
pub mod ooxml;
pub mod pdf;
pub mod text;
pub mod xml;
pub mod zip;

pub use bmp::{BmpHeader, decode_bmp};
pub use gopher::gopher_menu_to_html;
pub use html::{clean_html, convert_html_to_markdown, html_to_text};
pub use image::{decode_raster, generate_thumbnail};
pub use office_metadata::{AppProperties, CoreProperties};
pub use pdf::{ScanState, extract_pdf_text};
pub use text::summarize_text;
pub use xml::sniff_root_element;
pub use zip::ZipContainer;
