//! Office Open XML package metadata.
//!
//! OOXML packages (DOCX, XLSX, PPTX) carry their metadata in two parts:
//! - `docProps/core.xml` - Dublin Core fields (title, creator, language, ...)
//! - `docProps/app.xml` - application statistics (slide count, titles of parts, ...)
//!
//! Both are optional. A missing or malformed part yields default properties.

pub mod app_properties;
pub mod core_properties;

pub use app_properties::{AppProperties, parse_app_properties, read_app_properties};
pub use core_properties::{CoreProperties, parse_core_properties, read_core_properties};

use roxmltree::Node;

/// Parse text content from an XML element by local tag name
///
/// Returns the text content if the element exists and has non-empty text.
pub(crate) fn parse_xml_text(node: Node, name: &str) -> Option<String> {
    node.descendants()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Parse integer content from an XML element by local tag name
pub(crate) fn parse_xml_int(node: Node, name: &str) -> Option<u32> {
    node.descendants()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .and_then(|s| s.trim().parse::<u32>().ok())
}
