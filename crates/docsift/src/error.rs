//! Error types for docsift.
//!
//! Extraction is best-effort: format extractors degrade to weaker summaries
//! instead of failing, so most of these variants never reach the caller of
//! [`crate::dispatch`]. They are still returned from extractor internals,
//! registry construction and configuration loading.
//!
//! - `Io` - configuration files and CLI input (always bubble up unchanged)
//! - `Parsing` - malformed document structure inside an extractor
//! - `Validation` - invalid configuration or plugin names
//! - `ImageProcessing` - decode/resize/encode failures while building thumbnails
//! - `UnsupportedFormat` - input the plain-text fallback refuses (binary data)
//!
//! # Example
//!
//! ```rust
//! use docsift::{DocsiftError, Result};
//!
//! fn non_empty(content: &[u8]) -> Result<&[u8]> {
//!     if content.is_empty() {
//!         return Err(DocsiftError::validation("document is empty"));
//!     }
//!     Ok(content)
//! }
//! # assert!(non_empty(b"").is_err());
//! ```
use thiserror::Error;

/// Result type alias using `DocsiftError`.
pub type Result<T> = std::result::Result<T, DocsiftError>;

/// Main error type for all docsift operations.
#[derive(Debug, Error)]
pub enum DocsiftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {message}")]
    Parsing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Image processing error: {message}")]
    ImageProcessing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Plugin error in '{plugin_name}': {message}")]
    Plugin { message: String, plugin_name: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for DocsiftError {
    fn from(err: serde_json::Error) -> Self {
        DocsiftError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<zip::result::ZipError> for DocsiftError {
    fn from(err: zip::result::ZipError) -> Self {
        DocsiftError::Parsing {
            message: format!("Failed to read zip archive: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

impl From<roxmltree::Error> for DocsiftError {
    fn from(err: roxmltree::Error) -> Self {
        DocsiftError::Parsing {
            message: format!("Failed to parse XML: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

impl From<image::ImageError> for DocsiftError {
    fn from(err: image::ImageError) -> Self {
        DocsiftError::ImageProcessing {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        paste::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl DocsiftError {
    error_constructor!(parsing, Parsing);
    error_constructor!(validation, Validation);
    error_constructor!(image_processing, ImageProcessing);
    error_constructor!(serialization, Serialization);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DocsiftError = io_err.into();
        assert!(matches!(err, DocsiftError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_parsing_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad data");
        let err = DocsiftError::parsing_with_source("truncated object", source);
        assert_eq!(err.to_string(), "Parsing error: truncated object");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_validation_error() {
        let err = DocsiftError::validation("plugin name cannot be empty");
        assert_eq!(err.to_string(), "Validation error: plugin name cannot be empty");
    }

    #[test]
    fn test_image_processing_error() {
        let err = DocsiftError::image_processing("encode failed");
        assert_eq!(err.to_string(), "Image processing error: encode failed");
    }

    #[test]
    fn test_plugin_error() {
        let err = DocsiftError::Plugin {
            message: "initialize failed".to_string(),
            plugin_name: "feed-extractor".to_string(),
        };
        assert_eq!(err.to_string(), "Plugin error in 'feed-extractor': initialize failed");
    }

    #[test]
    fn test_unsupported_format_error() {
        let err = DocsiftError::UnsupportedFormat("binary content".to_string());
        assert_eq!(err.to_string(), "Unsupported format: binary content");
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: DocsiftError = json_err.into();
        assert!(matches!(err, DocsiftError::Serialization { .. }));
    }

    #[test]
    fn test_roxmltree_error_conversion() {
        let xml_err = roxmltree::Document::parse("<a><b></a>").unwrap_err();
        let err: DocsiftError = xml_err.into();
        assert!(matches!(err, DocsiftError::Parsing { .. }));
        assert!(err.to_string().contains("Failed to parse XML"));
    }

    #[test]
    fn test_io_error_bubbles_unchanged() {
        fn read_config() -> Result<String> {
            let content = std::fs::read_to_string("/nonexistent/docsift.toml")?;
            Ok(content)
        }

        assert!(matches!(read_config().unwrap_err(), DocsiftError::Io(_)));
    }
}
