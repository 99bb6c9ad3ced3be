use base64::Engine;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use url::Url;

/// The canonical record produced for one crawled document.
///
/// A `Summary` is created fresh by a single extractor call and owned by the
/// caller once returned. Indexing plugins may append `sub_documents` and
/// adjust fields after extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Source URL the summary was produced for.
    pub url: Url,

    /// MIME type handled by the extractor that produced this summary.
    pub mime_type: String,

    /// Document title, possibly empty.
    pub title: String,

    /// Description text, bounded by `max_description_len` characters.
    pub description: String,

    /// Authors declared by the document, when the format carries them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguageTag>,

    /// Canonicalized outbound links mapped to their accumulated anchor text.
    pub links: IndexMap<Url, String>,

    pub body: RenderedContent,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EncodedImage>,

    /// Upper-cased meta robots directives (`NOINDEX`, `NOFOLLOW`, ...).
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub robot_directives: BTreeSet<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_redirect: Option<Url>,

    /// The text of this document must not be indexed as body content.
    #[serde(default)]
    pub just_metadata: bool,

    /// Top terms when a word-cloud summarizer produced the description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_cloud: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_documents: Vec<SubDoc>,
}

impl Summary {
    /// Create an empty summary for `url` with the given rendered body.
    pub fn new(url: &Url, mime_type: impl Into<String>, body: RenderedContent) -> Self {
        Self {
            url: url.clone(),
            mime_type: mime_type.into(),
            title: String::new(),
            description: String::new(),
            authors: Vec::new(),
            language: None,
            links: IndexMap::new(),
            body,
            thumbnail: None,
            robot_directives: BTreeSet::new(),
            location_redirect: None,
            just_metadata: false,
            word_cloud: None,
            sub_documents: Vec::new(),
        }
    }

    /// True when nothing indexable was recovered.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.description.trim().is_empty()
            && self.links.is_empty()
            && self.location_redirect.is_none()
    }
}

/// Additional document derived from a summary by an indexing plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDoc {
    pub url: Url,
    pub title: String,
    pub description: String,
    pub mime_type: String,
}

/// Normalized, renderable representation of the original document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedContent {
    pub mime_type: String,
    pub content: String,
}

impl RenderedContent {
    pub fn html(content: impl Into<String>) -> Self {
        Self {
            mime_type: "text/html".to_string(),
            content: content.into(),
        }
    }

    pub fn xml(content: impl Into<String>) -> Self {
        Self {
            mime_type: "application/xml".to_string(),
            content: content.into(),
        }
    }
}

/// An encoded image (thumbnails).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl EncodedImage {
    /// Render the image as a `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

/// ISO 639-1 code when one exists, else the ISO 639-3 code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageTag(String);

impl LanguageTag {
    /// Build a tag from a raw declaration such as `en-US` or `EN_gb`.
    ///
    /// Returns `None` unless the primary subtag is two or three ASCII letters.
    pub fn parse(raw: &str) -> Option<Self> {
        let primary = raw.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        if (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(Self(primary))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_tag_parse() {
        assert_eq!(LanguageTag::parse("en-US").unwrap().as_str(), "en");
        assert_eq!(LanguageTag::parse(" DE_at ").unwrap().as_str(), "de");
        assert_eq!(LanguageTag::parse("deu").unwrap().as_str(), "deu");
        assert!(LanguageTag::parse("").is_none());
        assert!(LanguageTag::parse("english").is_none());
        assert!(LanguageTag::parse("e1").is_none());
    }

    #[test]
    fn test_new_summary_is_empty_with_body() {
        let url = Url::parse("https://example.com/a.txt").unwrap();
        let summary = Summary::new(&url, "text/plain", RenderedContent::html("<html></html>"));
        assert!(summary.is_empty());
        assert_eq!(summary.body.mime_type, "text/html");
        assert!(!summary.just_metadata);
    }

    #[test]
    fn test_encoded_image_data_uri() {
        let image = EncodedImage {
            mime_type: "image/jpeg".to_string(),
            width: 1,
            height: 1,
            data: vec![1, 2, 3],
        };
        assert_eq!(image.to_data_uri(), "data:image/jpeg;base64,AQID");
    }

    #[test]
    fn test_summary_serializes_thumbnail_as_base64() {
        let url = Url::parse("https://example.com/").unwrap();
        let mut summary = Summary::new(&url, "image/bmp", RenderedContent::html(""));
        summary.thumbnail = Some(EncodedImage {
            mime_type: "image/jpeg".to_string(),
            width: 2,
            height: 2,
            data: vec![0xff, 0xd8],
        });
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["thumbnail"]["data"], "/9g=");
        let back: Summary = serde_json::from_value(json).unwrap();
        assert_eq!(back, summary);
    }
}
