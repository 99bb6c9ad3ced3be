//! Text utilities shared by every extractor.

pub mod string_utils;
pub mod summarizer;

pub use string_utils::{collapse_whitespace, decode_text, escape_html, looks_binary, push_capped, truncate_chars};
pub use summarizer::{StrategySummarizer, Summarization, Summarizer};
