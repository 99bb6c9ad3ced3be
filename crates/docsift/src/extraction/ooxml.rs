//! Package relationships (`_rels/*.rels`) shared by the OOXML extractors.

use crate::error::Result;
use crate::extraction::xml::{decode_xml, parse_document};
use crate::extraction::zip::ZipContainer;
use crate::links::LinkCollector;
use ahash::AHashMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use roxmltree::Node;

const HYPERLINK_TYPE_SUFFIX: &str = "/hyperlink";

/// One `<Relationship>` entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `TargetMode="External"`
    pub external: bool,
}

impl Relationship {
    pub fn is_hyperlink(&self) -> bool {
        self.rel_type.ends_with(HYPERLINK_TYPE_SUFFIX)
    }
}

/// Path of the relationships part for `part`, e.g. `word/document.xml` →
/// `word/_rels/document.xml.rels`.
pub fn rels_entry_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

pub fn parse_relationships(xml_bytes: &[u8]) -> Result<Vec<Relationship>> {
    let xml = decode_xml(xml_bytes);
    let doc = parse_document(&xml)?;

    Ok(doc
        .descendants()
        .filter(|n| n.has_tag_name("Relationship"))
        .filter_map(|n| {
            Some(Relationship {
                id: n.attribute("Id")?.to_string(),
                rel_type: n.attribute("Type").unwrap_or_default().to_string(),
                target: n.attribute("Target")?.trim().to_string(),
                external: n
                    .attribute("TargetMode")
                    .is_some_and(|mode| mode.eq_ignore_ascii_case("external")),
            })
        })
        .collect())
}

/// Relationships of `part`; missing or malformed `.rels` parts give none.
pub fn read_relationships(container: &mut ZipContainer<'_>, part: &str) -> Vec<Relationship> {
    let entry = rels_entry_for(part);
    let Some(bytes) = container.get_entry(&entry) else {
        return Vec::new();
    };
    parse_relationships(&bytes).unwrap_or_else(|e| {
        tracing::debug!(entry = %entry, error = %e, "Ignoring malformed relationships part");
        Vec::new()
    })
}

/// The `r:id` attribute of an element, matched by local name in any namespace.
pub fn relationship_id<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.attributes()
        .find(|attr| attr.name() == "id" && attr.namespace().is_some())
        .map(|attr| attr.value())
}

/// Add every hyperlink relationship to `links`, using `anchors` (keyed by
/// relationship id) as link text.
pub fn collect_hyperlinks(relationships: &[Relationship], anchors: &AHashMap<String, String>, links: &mut LinkCollector<'_>) {
    for rel in relationships.iter().filter(|rel| rel.is_hyperlink()) {
        let text = anchors.get(&rel.id).map(String::as_str).unwrap_or_default();
        links.add(&rel.target, text);
    }
}

/// Text gathered from a WordprocessingML, DrawingML or SpreadsheetML part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartText {
    /// Paragraph text, one paragraph per line, capped at the requested length.
    pub text: String,
    /// Hyperlink text keyed by relationship id.
    pub anchors: AHashMap<String, String>,
    /// First `lang` attribute found on run properties.
    pub language: Option<String>,
}

/// Stream the text of a part, tolerating truncated XML.
///
/// Text comes from `t` elements; `p` and `si` end a paragraph, `tab`, `br`
/// and `cr` become whitespace. Hyperlink text is attributed through
/// `w:hyperlink` (wrapping runs) and `a:hlinkClick` (inside a run's
/// properties). Reading stops at the first XML error.
pub fn read_part_text(xml_bytes: &[u8], max_chars: usize) -> PartText {
    let mut reader = Reader::from_reader(xml_bytes);
    reader.config_mut().check_end_names = false;

    let mut part = PartText::default();
    let mut text_len = 0usize;
    let mut paragraph = String::new();
    let mut in_text = false;
    let mut hyperlink: Option<String> = None;
    let mut run_link: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(position = reader.buffer_position(), error = %e, "Stopping at malformed part XML");
                break;
            }
        };

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"hyperlink" => hyperlink = attribute_value(&e, b"id"),
                b"rPr" => note_language(&e, &mut part),
                b"hlinkClick" => run_link = attribute_value(&e, b"id"),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => paragraph.push('\t'),
                b"br" | b"cr" => paragraph.push('\n'),
                b"rPr" => note_language(&e, &mut part),
                b"hlinkClick" => run_link = attribute_value(&e, b"id"),
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => run_link = None,
                b"hyperlink" => hyperlink = None,
                b"p" | b"si" => flush_paragraph(&mut part.text, &mut text_len, &mut paragraph, max_chars),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let value = String::from_utf8_lossy(t.as_ref()).into_owned();
                push_run_text(&mut part, &mut paragraph, &value, hyperlink.as_deref(), run_link.as_deref());
            }
            Event::GeneralRef(r) if in_text => {
                if let Some(c) = crate::extraction::xml::resolve_entity(&String::from_utf8_lossy(&r)) {
                    let value = c.to_string();
                    push_run_text(&mut part, &mut paragraph, &value, hyperlink.as_deref(), run_link.as_deref());
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    flush_paragraph(&mut part.text, &mut text_len, &mut paragraph, max_chars);
    part.text.truncate(part.text.trim_end().len());
    part
}

fn attribute_value(element: &BytesStart<'_>, local_name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == local_name && attr.key.prefix().is_some())
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn note_language(element: &BytesStart<'_>, part: &mut PartText) {
    if part.language.is_some() {
        return;
    }
    part.language = element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"lang")
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
        .filter(|lang| !lang.trim().is_empty());
}

fn push_run_text(part: &mut PartText, paragraph: &mut String, value: &str, hyperlink: Option<&str>, run_link: Option<&str>) {
    paragraph.push_str(value);
    if let Some(id) = run_link.or(hyperlink) {
        part.anchors.entry(id.to_string()).or_default().push_str(value);
    }
}

fn flush_paragraph(text: &mut String, text_len: &mut usize, paragraph: &mut String, max_chars: usize) {
    let line = paragraph.trim();
    if !line.is_empty() && *text_len < max_chars {
        let room = max_chars - *text_len;
        let before = text.len();
        text.extend(line.chars().take(room));
        *text_len += text[before..].chars().count();
        if *text_len < max_chars {
            text.push('\n');
            *text_len += 1;
        }
    }
    paragraph.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::DefaultUrlResolver;
    use url::Url;

    const RELS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/a" TargetMode="External"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/a" TargetMode="External"/>
  <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="/relative"/>
</Relationships>"#;

    #[test]
    fn test_rels_entry_for() {
        assert_eq!(rels_entry_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_entry_for("ppt/slides/slide1.xml"), "ppt/slides/_rels/slide1.xml.rels");
        assert_eq!(rels_entry_for("root.xml"), "_rels/root.xml.rels");
    }

    #[test]
    fn test_parse_relationships() {
        let rels = parse_relationships(RELS).unwrap();
        assert_eq!(rels.len(), 4);
        assert!(!rels[0].is_hyperlink());
        assert!(rels[1].is_hyperlink() && rels[1].external);
        assert!(!rels[3].external);
    }

    #[test]
    fn test_collect_hyperlinks_accumulates_text() {
        let rels = parse_relationships(RELS).unwrap();
        let mut anchors = AHashMap::new();
        anchors.insert("rId2".to_string(), "first".to_string());
        anchors.insert("rId3".to_string(), "second".to_string());

        let base = Url::parse("https://docs.example/report.docx").unwrap();
        let resolver = DefaultUrlResolver;
        let mut links = LinkCollector::new(&base, &resolver, 10, 1024);
        collect_hyperlinks(&rels, &anchors, &mut links);

        let links = links.into_links();
        assert_eq!(links.len(), 2);
        assert_eq!(links[&Url::parse("https://example.com/a").unwrap()], "first second");
        assert!(links.contains_key(&Url::parse("https://docs.example/relative").unwrap()));
    }

    #[test]
    fn test_read_part_text_wordprocessing() {
        let xml = br#"<w:document xmlns:w="urn:w" xmlns:r="urn:r"><w:body>
<w:p><w:r><w:t>First</w:t></w:r><w:r><w:tab/><w:t xml:space="preserve">para &amp; more</w:t></w:r></w:p>
<w:p><w:hyperlink r:id="rId5"><w:r><w:t>Click</w:t></w:r><w:r><w:t> here</w:t></w:r></w:hyperlink></w:p>
</w:body></w:document>"#;
        let part = read_part_text(xml, 1000);
        assert_eq!(part.text, "First\tpara & more\nClick here");
        assert_eq!(part.anchors.get("rId5").map(String::as_str), Some("Click here"));
    }

    #[test]
    fn test_read_part_text_drawingml() {
        let xml = br#"<p:sld xmlns:a="urn:a" xmlns:p="urn:p" xmlns:r="urn:r"><a:p>
<a:r><a:rPr lang="de-DE"><a:hlinkClick r:id="rId2"/></a:rPr><a:t>Linked</a:t></a:r>
<a:r><a:rPr lang="en-US"/><a:t> plain</a:t></a:r></a:p></p:sld>"#;
        let part = read_part_text(xml, 1000);
        assert_eq!(part.text, "Linked plain");
        assert_eq!(part.anchors.get("rId2").map(String::as_str), Some("Linked"));
        assert_eq!(part.language.as_deref(), Some("de-DE"));
    }

    #[test]
    fn test_read_part_text_truncated_and_capped() {
        let xml = b"<sst><si><t>alpha</t></si><si><t>beta</t></si><si><t>gam";
        assert_eq!(read_part_text(xml, 1000).text, "alpha\nbeta\ngam");
        assert_eq!(read_part_text(xml, 8).text, "alpha\nbe");
    }

    #[test]
    fn test_relationship_id() {
        let xml = r#"<w:hyperlink xmlns:w="urn:w" xmlns:r="urn:r" r:id="rId7" w:history="1"/>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        assert_eq!(relationship_id(doc.root_element()), Some("rId7"));
    }
}
