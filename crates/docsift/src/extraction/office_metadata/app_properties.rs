//! Application properties extraction from docProps/app.xml

use crate::error::Result;
use crate::extraction::xml::{decode_xml, parse_document};
use crate::extraction::zip::ZipContainer;
use roxmltree::Node;

pub const APP_PROPERTIES_ENTRY: &str = "docProps/app.xml";

/// Part counts from `app.xml`, used to enumerate slides and worksheets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppProperties {
    /// Number of slides (PPTX)
    pub slides: Option<u32>,
    /// Names of the document parts: worksheet names, slide titles, ...
    pub titles_of_parts: Vec<String>,
}

/// Parse the contents of an `app.xml` part.
pub fn parse_app_properties(xml_bytes: &[u8]) -> Result<AppProperties> {
    let xml = decode_xml(xml_bytes);
    let doc = parse_document(&xml)?;
    let root = doc.root_element();

    Ok(AppProperties {
        slides: super::parse_xml_int(root, "Slides"),
        titles_of_parts: extract_titles_of_parts(root),
    })
}

/// Read `docProps/app.xml` from a package.
///
/// Returns `None` when the part is missing or malformed so callers can fall
/// back to counting archive entries.
pub fn read_app_properties(container: &mut ZipContainer<'_>) -> Option<AppProperties> {
    let bytes = container.get_entry(APP_PROPERTIES_ENTRY)?;
    match parse_app_properties(&bytes) {
        Ok(props) => Some(props),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed app.xml");
            None
        }
    }
}

fn extract_titles_of_parts(root: Node) -> Vec<String> {
    let Some(vector) = root
        .descendants()
        .find(|n| n.has_tag_name("TitlesOfParts"))
        .and_then(|titles| titles.descendants().find(|n| n.has_tag_name("vector")))
    else {
        return Vec::new();
    };

    vector
        .descendants()
        .filter(|n| n.has_tag_name("lpstr"))
        .filter_map(|n| n.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(String::from)
        .collect()
}
