//! Configuration loading and management.
//!
//! This module provides utilities for loading extraction configuration from various
//! sources (TOML, YAML, JSON) and discovering configuration files in the project hierarchy.

use crate::{DocsiftError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default upper bound on description length, in characters.
pub const DEFAULT_MAX_DESCRIPTION_LEN: usize = 2048;

/// Main extraction configuration.
///
/// All limits are hard caps: exceeding one truncates output silently.
///
/// # Example
///
/// ```rust
/// use docsift::core::config::ExtractionConfig;
///
/// let config = ExtractionConfig::default();
/// assert_eq!(config.max_links_per_document, 1000);
///
/// // let config = ExtractionConfig::from_toml_file("docsift.toml")?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Maximum description length in characters
    #[serde(default = "default_max_description_len")]
    pub max_description_len: usize,

    /// Maximum title length in characters (heading-derived HTML titles)
    #[serde(default = "default_max_title_len")]
    pub max_title_len: usize,

    #[serde(default)]
    pub summarizer_strategy: SummarizerStrategy,

    #[serde(default = "default_max_links_per_document")]
    pub max_links_per_document: usize,

    /// Link cap for sitemaps, which legitimately carry many more entries
    #[serde(default = "default_max_links_per_sitemap")]
    pub max_links_per_sitemap: usize,

    /// URLs with this many bytes or more are dropped
    #[serde(default = "default_max_url_length")]
    pub max_url_length: usize,

    /// Images wider or taller than this are not decoded
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,

    /// Edge length of the square thumbnail canvas
    #[serde(default = "default_thumbnail_dimension")]
    pub thumbnail_dimension: u32,

    #[serde(default)]
    pub pdf: PdfHeuristics,

    #[serde(default)]
    pub language_detection: LanguageDetectionConfig,

    /// Concurrency limit for batch extraction (defaults to `num_cpus * 2`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_extractions: Option<usize>,
}

/// How descriptions are produced from document text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarizerStrategy {
    /// Truncated leading text
    #[default]
    Basic,
    /// Sentences closest to the term centroid, plus a word cloud
    Centroid,
    /// Sentences ranked by overlap with the rest of the document
    GraphBased,
}

/// Word-break heuristics used while scanning PDF text operators.
///
/// These are approximations tuned on real-world documents, not exact rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfHeuristics {
    /// Insert a space after each `]TJ`
    #[serde(default = "default_true")]
    pub space_after_tj: bool,

    /// Insert a newline instead when a font change follows `]TJ`
    #[serde(default = "default_true")]
    pub newline_on_font_change: bool,

    /// Negative kerning of at least this magnitude after a string becomes a space
    #[serde(default = "default_kerning_threshold")]
    pub kerning_word_break_threshold: u32,
}

/// Language detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageDetectionConfig {
    /// Enable statistical detection (URL and markup hints are always used)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum confidence threshold (0.0-1.0)
    #[serde(default = "default_confidence")]
    pub min_confidence: f64,
}

fn default_true() -> bool {
    true
}
fn default_max_description_len() -> usize {
    DEFAULT_MAX_DESCRIPTION_LEN
}
fn default_max_title_len() -> usize {
    512
}
fn default_max_links_per_document() -> usize {
    1000
}
fn default_max_links_per_sitemap() -> usize {
    50_000
}
fn default_max_url_length() -> usize {
    1024
}
fn default_max_image_dimension() -> u32 {
    8192
}
fn default_thumbnail_dimension() -> u32 {
    128
}
fn default_kerning_threshold() -> u32 {
    100
}
fn default_confidence() -> f64 {
    0.5
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_description_len: default_max_description_len(),
            max_title_len: default_max_title_len(),
            summarizer_strategy: SummarizerStrategy::default(),
            max_links_per_document: default_max_links_per_document(),
            max_links_per_sitemap: default_max_links_per_sitemap(),
            max_url_length: default_max_url_length(),
            max_image_dimension: default_max_image_dimension(),
            thumbnail_dimension: default_thumbnail_dimension(),
            pdf: PdfHeuristics::default(),
            language_detection: LanguageDetectionConfig::default(),
            max_concurrent_extractions: None,
        }
    }
}

impl Default for PdfHeuristics {
    fn default() -> Self {
        Self {
            space_after_tj: true,
            newline_on_font_change: true,
            kerning_word_break_threshold: default_kerning_threshold(),
        }
    }
}

impl Default for LanguageDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_confidence: default_confidence(),
        }
    }
}

impl ExtractionConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `DocsiftError::Validation` if file doesn't exist or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        toml::from_str(&content)
            .map_err(|e| DocsiftError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        serde_yaml_ng::from_str(&content)
            .map_err(|e| DocsiftError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        serde_json::from_str(&content)
            .map_err(|e| DocsiftError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration, picking the format from the file extension.
    ///
    /// Unknown extensions are parsed as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase) {
            Some(ext) if ext == "yaml" || ext == "yml" => Self::from_yaml_file(path),
            Some(ext) if ext == "json" => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Discover `docsift.toml` in the current directory or one of its parents.
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(DocsiftError::Io)?;
        Self::discover_from(&current)
    }

    /// Discover `docsift.toml` starting at `start` and walking up.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover_from(start: &Path) -> Result<Option<Self>> {
        let mut current = Some(start);

        while let Some(dir) = current {
            let candidate = dir.join("docsift.toml");
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Effective batch concurrency.
    pub fn concurrency_limit(&self) -> usize {
        self.max_concurrent_extractions
            .filter(|&limit| limit > 0)
            .unwrap_or_else(|| num_cpus::get() * 2)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| DocsiftError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}
