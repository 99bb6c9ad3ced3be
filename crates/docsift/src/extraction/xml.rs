//! XML helpers shared by the XML-based extractors.
//!
//! [`sniff_root_element`] streams with `quick-xml` so it only reads as far as
//! the first element. [`parse_document`] builds a `roxmltree` tree with DTDs
//! allowed, since many feeds still carry a `<!DOCTYPE>`.

use crate::error::{DocsiftError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Name of the outermost element, lower-cased, including any prefix.
///
/// Returns `None` when no element start is found before EOF or a syntax
/// error.
pub fn sniff_root_element(xml_bytes: &[u8]) -> Option<String> {
    let mut reader = Reader::from_reader(xml_bytes);
    reader.config_mut().check_end_names = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.name().as_ref()).to_lowercase());
            }
            Ok(Event::Eof) => return None,
            Err(e) => {
                tracing::debug!(position = reader.buffer_position(), error = %e, "Root element sniffing failed");
                return None;
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Decode XML bytes for `roxmltree`, dropping a leading BOM.
pub fn decode_xml(xml_bytes: &[u8]) -> String {
    let bytes = xml_bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(xml_bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Parse a complete XML document.
pub fn parse_document(xml: &str) -> Result<roxmltree::Document<'_>> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    roxmltree::Document::parse_with_options(xml, options)
        .map_err(|e| DocsiftError::parsing_with_source("Failed to parse XML document", e))
}

/// Resolve an XML entity or character reference name (`amp`, `#38`, `#x26`).
pub fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let reference = name.strip_prefix('#')?;
            let code = match reference.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => reference.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Concatenated text of every descendant text node, whitespace collapsed.
pub fn node_text(node: roxmltree::Node<'_, '_>) -> String {
    let joined = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<Vec<_>>()
        .join(" ");
    crate::text::collapse_whitespace(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_root_element() {
        let xml = b"<?xml version=\"1.0\"?>\n<!-- sitemap -->\n<urlset xmlns=\"x\"><url/></urlset>";
        assert_eq!(sniff_root_element(xml).as_deref(), Some("urlset"));
        assert_eq!(sniff_root_element(b"<rdf:RDF/>").as_deref(), Some("rdf:rdf"));
        assert_eq!(
            sniff_root_element(b"<!DOCTYPE rss SYSTEM \"x.dtd\"><rss version=\"0.91\">").as_deref(),
            Some("rss")
        );
    }

    #[test]
    fn test_sniff_without_element() {
        assert_eq!(sniff_root_element(b""), None);
        assert_eq!(sniff_root_element(b"just text"), None);
    }

    #[test]
    fn test_parse_document_allows_doctype() {
        let xml = decode_xml(b"\xEF\xBB\xBF<!DOCTYPE rss><rss><channel><title>T</title></channel></rss>");
        let doc = parse_document(&xml).unwrap();
        assert_eq!(doc.root_element().tag_name().name(), "rss");
        assert!(parse_document("<broken").is_err());
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp"), Some('&'));
        assert_eq!(resolve_entity("#38"), Some('&'));
        assert_eq!(resolve_entity("#x26"), Some('&'));
        assert_eq!(resolve_entity("nbsp"), None);
    }

    #[test]
    fn test_node_text() {
        let doc = roxmltree::Document::parse("<p>Hello <b>bold</b>\n  world</p>").unwrap();
        assert_eq!(node_text(doc.root_element()), "Hello bold world");
    }
}
