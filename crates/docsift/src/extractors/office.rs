//! Summary assembly shared by the DOCX, PPTX and XLSX extractors.

use crate::core::context::ExtractionContext;
use crate::extraction::text::render_preformatted;
use crate::text::truncate_chars;
use crate::types::{LanguageTag, RenderedContent, Summary};
use indexmap::IndexMap;
use url::Url;

/// Fields recovered from an Office Open XML package.
#[derive(Debug, Default)]
pub(super) struct PackageContent {
    pub title: String,
    pub authors: Vec<String>,
    /// Language declared by the package (core properties or run properties).
    pub declared_language: Option<String>,
    pub text: String,
    pub links: IndexMap<Url, String>,
}

/// Summary of a package that could not be opened at all.
pub(super) fn unreadable_package(url: &Url, mime_type: &str) -> Summary {
    tracing::debug!(url = %url, mime_type, "Archive unreadable, returning empty summary");
    Summary::new(url, mime_type, RenderedContent::html(render_preformatted("")))
}

pub(super) fn package_summary(url: &Url, mime_type: &str, content: PackageContent, ctx: &ExtractionContext) -> Summary {
    let mut summary = Summary::new(url, mime_type, RenderedContent::html(render_preformatted(&content.text)));

    let language = content
        .declared_language
        .as_deref()
        .and_then(LanguageTag::parse)
        .or_else(|| {
            let sample = format!("{} {}", content.title, content.text);
            ctx.guess_language(&sample, Some(url))
        });

    if !content.text.trim().is_empty() {
        let summarization = ctx.summarize(&content.text, language.as_ref());
        summary.description = summarization.description;
        summary.word_cloud = summarization.word_cloud;
    }

    summary.title = truncate_chars(content.title.trim(), ctx.config().max_title_len);
    summary.authors = content.authors;
    summary.language = language;
    summary.links = content.links;
    summary
}
