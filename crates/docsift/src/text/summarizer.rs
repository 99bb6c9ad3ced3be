//! Description strategies.
//!
//! `Basic` keeps the leading text, `Centroid` replaces the text with its most
//! frequent terms (a word cloud), and `GraphBased` ranks sentences by how much
//! vocabulary they share with the rest of the document.

use crate::core::config::SummarizerStrategy;
use crate::text::string_utils::{collapse_whitespace, push_capped, truncate_chars};
use crate::types::LanguageTag;
use ahash::{AHashMap, AHashSet};
use once_cell::sync::Lazy;

/// Terms kept in a word cloud.
pub const WORD_CLOUD_SIZE: usize = 20;

const MIN_TERM_CHARS: usize = 3;
const PAGERANK_ITERATIONS: usize = 30;
const PAGERANK_DAMPING: f64 = 0.85;
/// Sentences considered by the graph ranker.
const MAX_GRAPH_SENTENCES: usize = 200;

static STOPWORDS: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        // en
        "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was", "one", "our", "out",
        "has", "him", "his", "how", "its", "may", "new", "now", "see", "two", "who", "did", "get", "let", "say", "she",
        "too", "use", "that", "with", "have", "this", "will", "your", "from", "they", "been", "were", "which", "their",
        "there", "what", "about", "would", "these", "other", "into", "more", "some", "than", "then", "them", "also",
        "only", "such", "when", "where", "while", "each", "very", "just", "over", "here",
        // de
        "der", "die", "das", "und", "ist", "ein", "eine", "nicht", "mit", "von", "den", "dem", "des", "auf", "für",
        "sich", "auch", "als", "wie", "bei", "oder", "aus", "wird", "sind", "noch", "nach", "werden", "einer", "eines",
        // fr / es
        "les", "des", "une", "est", "pour", "dans", "que", "qui", "sur", "pas", "par", "avec", "del", "los", "las",
        "por", "con", "una", "para", "como",
    ]
    .into_iter()
    .collect()
});

/// Result of summarizing a text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summarization {
    pub description: String,
    pub word_cloud: Option<Vec<String>>,
}

/// Collaborator producing a bounded description from document text.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str, language: Option<&LanguageTag>, max_len: usize) -> Summarization;
}

/// Summarizer driven by [`SummarizerStrategy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategySummarizer {
    strategy: SummarizerStrategy,
}

impl StrategySummarizer {
    pub fn new(strategy: SummarizerStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> SummarizerStrategy {
        self.strategy
    }
}

impl Summarizer for StrategySummarizer {
    fn summarize(&self, text: &str, _language: Option<&LanguageTag>, max_len: usize) -> Summarization {
        match self.strategy {
            SummarizerStrategy::Basic => Summarization {
                description: truncate_chars(&collapse_whitespace(text), max_len),
                word_cloud: None,
            },
            SummarizerStrategy::Centroid => centroid(text, max_len),
            SummarizerStrategy::GraphBased => graph_based(text, max_len),
        }
    }
}

fn centroid(text: &str, max_len: usize) -> Summarization {
    let cloud = word_cloud(text, WORD_CLOUD_SIZE);
    if cloud.is_empty() {
        return Summarization {
            description: truncate_chars(&collapse_whitespace(text), max_len),
            word_cloud: None,
        };
    }

    let mut description = String::new();
    for term in &cloud {
        if !push_capped(&mut description, term, max_len) {
            break;
        }
    }
    Summarization {
        description,
        word_cloud: Some(cloud),
    }
}

fn graph_based(text: &str, max_len: usize) -> Summarization {
    let sentences: Vec<String> = split_sentences(text).into_iter().take(MAX_GRAPH_SENTENCES).collect();
    if sentences.len() < 3 {
        return Summarization {
            description: truncate_chars(&collapse_whitespace(text), max_len),
            word_cloud: None,
        };
    }

    let term_sets: Vec<AHashSet<String>> = sentences.iter().map(|s| terms(s).collect()).collect();
    let n = sentences.len();
    let mut weights = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let overlap = term_sets[i].intersection(&term_sets[j]).count() as f64;
            if overlap == 0.0 {
                continue;
            }
            let norm = ((term_sets[i].len() as f64).ln_1p() + (term_sets[j].len() as f64).ln_1p()).max(1.0);
            weights[i][j] = overlap / norm;
            weights[j][i] = overlap / norm;
        }
    }

    let out_sums: Vec<f64> = weights.iter().map(|row| row.iter().sum()).collect();
    let mut scores = vec![1.0 / n as f64; n];
    for _ in 0..PAGERANK_ITERATIONS {
        let mut next = vec![(1.0 - PAGERANK_DAMPING) / n as f64; n];
        for (i, score) in next.iter_mut().enumerate() {
            let incoming: f64 = (0..n)
                .filter(|&j| out_sums[j] > 0.0)
                .map(|j| weights[j][i] / out_sums[j] * scores[j])
                .sum();
            *score += PAGERANK_DAMPING * incoming;
        }
        scores = next;
    }

    let mut ranked: Vec<usize> = (0..n).collect();
    ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

    let mut chosen = Vec::new();
    let mut used = 0usize;
    for idx in ranked {
        let len = sentences[idx].chars().count() + 1;
        if used + len > max_len && !chosen.is_empty() {
            continue;
        }
        chosen.push(idx);
        used += len;
        if used >= max_len {
            break;
        }
    }
    chosen.sort_unstable();

    let joined = chosen
        .iter()
        .map(|&idx| sentences[idx].as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Summarization {
        description: truncate_chars(&joined, max_len),
        word_cloud: None,
    }
}

/// Most frequent non-stopword terms, ties broken by first occurrence.
pub fn word_cloud(text: &str, size: usize) -> Vec<String> {
    let mut counts: AHashMap<String, (usize, usize)> = AHashMap::new();
    for (position, term) in terms(text).enumerate() {
        counts.entry(term).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
    ranked.into_iter().take(size).map(|(term, _)| term).collect()
}

fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= MIN_TERM_CHARS)
        .filter(|word| !word.chars().all(|c| c.is_ascii_digit()))
        .map(|word| word.to_lowercase())
        .filter(|word| !STOPWORDS.contains(word.as_str()))
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        let boundary = matches!(c, '.' | '!' | '?' | '。') && chars.peek().is_none_or(|next| next.is_whitespace());
        if boundary || (c == '\n' && chars.peek() == Some(&'\n')) {
            let sentence = collapse_whitespace(&current);
            if sentence.chars().any(char::is_alphanumeric) {
                sentences.push(sentence);
            }
            current.clear();
        }
    }
    let rest = collapse_whitespace(&current);
    if rest.chars().any(char::is_alphanumeric) {
        sentences.push(rest);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Rust crawlers parse documents. Crawlers fetch documents from the web. \
                        The weather was pleasant yesterday. Parsing documents requires robust crawlers.";

    #[test]
    fn test_basic_truncates_and_collapses() {
        let summarizer = StrategySummarizer::new(SummarizerStrategy::Basic);
        let result = summarizer.summarize("  a\n\n b   c  ", None, 3);
        assert_eq!(result.description, "a b");
        assert!(result.word_cloud.is_none());
    }

    #[test]
    fn test_centroid_builds_word_cloud() {
        let summarizer = StrategySummarizer::new(SummarizerStrategy::Centroid);
        let result = summarizer.summarize(TEXT, None, 100);
        let cloud = result.word_cloud.unwrap();
        assert_eq!(cloud[0], "crawlers");
        assert_eq!(cloud[1], "documents");
        assert!(!cloud.contains(&"the".to_string()));
        assert!(result.description.starts_with("crawlers documents"));
    }

    #[test]
    fn test_graph_based_prefers_connected_sentences() {
        let summarizer = StrategySummarizer::new(SummarizerStrategy::GraphBased);
        let result = summarizer.summarize(TEXT, None, 60);
        assert!(result.description.chars().count() <= 60);
        assert!(!result.description.contains("weather"));
        assert!(result.description.contains("documents"));
    }

    #[test]
    fn test_graph_based_short_text_falls_back() {
        let summarizer = StrategySummarizer::new(SummarizerStrategy::GraphBased);
        let result = summarizer.summarize("One sentence only.", None, 100);
        assert_eq!(result.description, "One sentence only.");
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("First one. Second one!\n\nThird v1.2 stays");
        assert_eq!(sentences, vec!["First one.", "Second one!", "Third v1.2 stays"]);
    }

    #[test]
    fn test_every_strategy_respects_max_len() {
        let long = TEXT.repeat(40);
        for strategy in [
            SummarizerStrategy::Basic,
            SummarizerStrategy::Centroid,
            SummarizerStrategy::GraphBased,
        ] {
            let result = StrategySummarizer::new(strategy).summarize(&long, None, 50);
            assert!(result.description.chars().count() <= 50, "{:?}", strategy);
        }
    }
}
