//! Tokenization for page analytics.
//!
//! Three deliberately different token definitions coexist here:
//! - `token_counts`: ASCII-letter runs of length >= 2, lowercased, stopwords
//!   removed. Feeds the global word-frequency table.
//! - `word_count`: bare ASCII-letter runs, no length or stopword
//!   restriction. The longest-page metric.
//! - `word_char_runs`: word-character runs. The low-information gate metric.
//!
//! They must not be conflated; the aggregates they feed are defined on
//! different token populations.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    static ref WORD_TOKENS: Regex =
        Regex::new(r"[a-zA-Z]{2,}").expect("Invalid token regex");
    static ref LETTER_RUNS: Regex =
        Regex::new(r"[a-zA-Z]+").expect("Invalid letter-run regex");
    static ref WORD_CHAR_RUNS: Regex =
        Regex::new(r"\w+").expect("Invalid word-char regex");

    /// Common English words and contraction fragments ("aren't" tokenizes to
    /// "aren" + "t") excluded from the frequency table.
    static ref STOPWORDS: HashSet<&'static str> = [
        "a", "also", "about", "above", "after", "again", "against", "all",
        "am", "an", "and", "any", "are", "aren", "as", "at", "be", "because",
        "been", "before", "being", "below", "between", "both", "but", "by",
        "can", "cannot", "could", "couldn", "did", "didn", "do", "does",
        "doesn", "doing", "don", "down", "during", "each", "few", "for",
        "from", "further", "had", "hadn", "has", "hasn", "have", "having",
        "he", "her", "here", "hers", "herself", "him", "himself", "his",
        "how", "i", "if", "in", "into", "is", "isn", "it", "its", "itself",
        "let", "me", "may", "more", "most", "mustn", "my", "myself", "no",
        "nor", "not", "of", "off", "on", "once", "only", "or", "other",
        "ought", "our", "ours", "ourselves", "out", "over", "own", "same",
        "shan", "she", "should", "shouldn", "so", "some", "such", "than",
        "that", "the", "their", "theirs", "them", "themselves", "then",
        "there", "these", "they", "this", "those", "through", "to", "too",
        "under", "until", "up", "very", "was", "wasn", "we", "were", "weren",
        "what", "when", "where", "which", "while", "who", "whom", "why",
        "will", "with", "would", "wouldn", "you", "your", "yours",
        "yourself", "yourselves", "ll", "re", "ve",
    ]
    .into_iter()
    .collect();
}

/// Frequency-table tokens in document order: letter runs of length >= 2,
/// lowercased, with stopwords removed.
pub fn token_stream(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD_TOKENS
        .find_iter(text.trim())
        .map(|m| m.as_str().to_lowercase())
        .filter(|token| !STOPWORDS.contains(token.as_str()))
}

/// Per-page frequency table built over `token_stream`.
pub fn token_counts(text: &str) -> HashMap<String, u64> {
    let mut counts = HashMap::new();
    for token in token_stream(text) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

/// Count of alphabetic runs, stopwords and single letters included.
pub fn word_count(text: &str) -> usize {
    LETTER_RUNS.find_iter(text).count()
}

/// Count of word-character runs. A page below the minimum is too sparse to
/// index or crawl further from.
pub fn word_char_runs(text: &str) -> usize {
    WORD_CHAR_RUNS.find_iter(text).count()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}
