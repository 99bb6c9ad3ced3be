//! Core properties extraction from docProps/core.xml
//!
//! Extracts Dublin Core metadata from Office Open XML documents.

use crate::error::Result;
use crate::extraction::xml::{decode_xml, parse_document};
use crate::extraction::zip::ZipContainer;

pub const CORE_PROPERTIES_ENTRY: &str = "docProps/core.xml";

/// The Dublin Core fields a summary draws on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreProperties {
    pub title: Option<String>,
    /// `dc:creator`, reported as the single author
    pub creator: Option<String>,
    /// Usually a BCP 47 tag such as `en-US`
    pub language: Option<String>,
}

/// Parse the contents of a `core.xml` part.
///
/// # Errors
///
/// Returns a parsing error when the XML is malformed.
pub fn parse_core_properties(xml_bytes: &[u8]) -> Result<CoreProperties> {
    let xml = decode_xml(xml_bytes);
    let doc = parse_document(&xml)?;
    let root = doc.root_element();

    Ok(CoreProperties {
        title: super::parse_xml_text(root, "title"),
        creator: super::parse_xml_text(root, "creator"),
        language: super::parse_xml_text(root, "language"),
    })
}

/// Read `docProps/core.xml` from a package.
///
/// Missing or malformed parts yield empty properties.
pub fn read_core_properties(container: &mut ZipContainer<'_>) -> CoreProperties {
    let Some(bytes) = container.get_entry(CORE_PROPERTIES_ENTRY) else {
        return CoreProperties::default();
    };
    parse_core_properties(&bytes).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Ignoring malformed core.xml");
        CoreProperties::default()
    })
}
