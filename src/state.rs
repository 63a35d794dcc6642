//! Process-wide crawl aggregates.
//!
//! All mutable crawl bookkeeping lives in one explicit [`CrawlState`] value
//! constructed empty, instead of ambient module globals, so tests get fresh
//! state and parallel embedders can put the whole thing behind one lock.

use crate::config::Config;
use crate::dedup::ContentDedup;
use crate::url_utils;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;
use url::Url;

/// Occurrence counters keyed by scheme+host+path (query and fragment
/// stripped). Used only for trap detection; grows monotonically and is never
/// reset mid-crawl.
#[derive(Debug, Default)]
pub struct PatternLog {
    counts: HashMap<String, u32>,
}

impl PatternLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one evaluation of `key` and return the updated count.
    pub fn observe(&mut self, key: &str) -> u32 {
        let count = self.counts.entry(key.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, key: &str) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// The page with the highest alphabetic-word count seen so far. `url` is
/// empty until the first qualifying page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LongestPage {
    pub url: String,
    pub words: usize,
}

#[derive(Debug, Clone, Copy)]
struct WordStat {
    count: u64,
    first_seen: u64,
}

/// Exported view of all aggregates at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub unique_url_count: usize,
    pub longest_page: LongestPage,
    /// Top tokens by descending count, ties by first appearance.
    pub top_words: Vec<(String, u64)>,
    /// Lexicographically sorted host -> unique-page count.
    pub subdomains: Vec<(String, u64)>,
}

/// All crawl-wide aggregates: unique-URL set, pattern log, seen-content set,
/// longest-page record, global word-frequency table, subdomain census.
#[derive(Debug, Default)]
pub struct CrawlState {
    unique_urls: HashSet<String>,
    patterns: PatternLog,
    dedup: ContentDedup,
    longest_page: LongestPage,
    word_freq: HashMap<String, WordStat>,
    word_seq: u64,
    subdomains: BTreeMap<String, u64>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Domain scope & uniqueness gate.
    ///
    /// Returns `true` exactly once per Canonical URL whose host ends with an
    /// allowed suffix, inserting it into the unique-URL set and, for hosts
    /// under the census suffix, bumping that host's census entry. Callers
    /// must invoke this at most once per discovered link per page: a repeat
    /// call for the same link would undercount true uniqueness.
    ///
    /// `url` must already be canonical (fragment stripped by the normalizer).
    pub fn admit_if_new(&mut self, url: &Url) -> bool {
        let Some(host) = url_utils::extract_host(url) else {
            return false;
        };

        if !Config::ALLOWED_DOMAIN_SUFFIXES
            .iter()
            .any(|suffix| host.ends_with(suffix))
        {
            return false;
        }

        if !self.unique_urls.insert(url.as_str().to_string()) {
            return false;
        }

        if host.ends_with(Config::CENSUS_DOMAIN_SUFFIX) {
            *self.subdomains.entry(host).or_insert(0) += 1;
        }

        debug!(url = url.as_str(), "admitted new unique URL");
        true
    }

    /// Update the longest-page record and the global word-frequency table
    /// from one accepted, non-duplicate page.
    ///
    /// The longest-page metric counts every alphabetic run; the frequency
    /// table only sees tokens of length >= 2 with stopwords removed. The two
    /// counts are intentionally different.
    pub fn record_page(&mut self, url: &str, text: &str) {
        let words = crate::tokenize::word_count(text);
        // Strict >: ties keep the earlier record holder.
        if words > self.longest_page.words {
            self.longest_page = LongestPage {
                url: url.to_string(),
                words,
            };
        }

        for (token, count) in ordered_token_counts(text) {
            match self.word_freq.get_mut(&token) {
                Some(stat) => stat.count += count,
                None => {
                    let stat = WordStat {
                        count,
                        first_seen: self.word_seq,
                    };
                    self.word_seq += 1;
                    self.word_freq.insert(token, stat);
                }
            }
        }
    }

    /// Content-duplicate gate; inserts the fingerprint on first sight.
    pub fn is_duplicate_content(&mut self, text: &str) -> bool {
        self.dedup.is_duplicate(text)
    }

    pub fn patterns_mut(&mut self) -> &mut PatternLog {
        &mut self.patterns
    }

    pub fn patterns(&self) -> &PatternLog {
        &self.patterns
    }

    pub fn unique_url_count(&self) -> usize {
        self.unique_urls.len()
    }

    pub fn contains_url(&self, canonical: &str) -> bool {
        self.unique_urls.contains(canonical)
    }

    pub fn longest_page(&self) -> &LongestPage {
        &self.longest_page
    }

    pub fn subdomain_count(&self, host: &str) -> u64 {
        self.subdomains.get(host).copied().unwrap_or(0)
    }

    /// Top `limit` tokens by descending count; equal counts order by first
    /// appearance in the crawl.
    pub fn top_words(&self, limit: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<(&String, &WordStat)> = self.word_freq.iter().collect();
        entries.sort_by(|a, b| {
            b.1.count
                .cmp(&a.1.count)
                .then(a.1.first_seen.cmp(&b.1.first_seen))
        });
        entries
            .into_iter()
            .take(limit)
            .map(|(token, stat)| (token.clone(), stat.count))
            .collect()
    }

    pub fn word_frequency(&self, token: &str) -> u64 {
        self.word_freq.get(token).map(|s| s.count).unwrap_or(0)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            unique_url_count: self.unique_urls.len(),
            longest_page: self.longest_page.clone(),
            top_words: self.top_words(Config::TOP_WORD_COUNT),
            subdomains: self
                .subdomains
                .iter()
                .map(|(host, count)| (host.clone(), *count))
                .collect(),
        }
    }
}

/// Per-page token counts in order of first appearance, so first-seen
/// tie-break ordering stays deterministic across runs.
fn ordered_token_counts(text: &str) -> Vec<(String, u64)> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u64> = HashMap::new();
    for token in crate::tokenize::token_stream(text) {
        match counts.get_mut(&token) {
            Some(c) => *c += 1,
            None => {
                counts.insert(token.clone(), 1);
                order.push(token);
            }
        }
    }
    order
        .into_iter()
        .map(|token| {
            let count = counts[&token];
            (token, count)
        })
        .collect()
}
