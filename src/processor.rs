//! Per-page processing pipeline.
//!
//! Drives validation, decoding, quality gates, deduplication, analytics and
//! link filtering for one fetched page, returning the links worth enqueuing.
//! Fetching, scheduling and politeness belong to the embedding framework.

use crate::config::Config;
use crate::filters::{self, FilterError};
use crate::parser;
use crate::state::{CrawlState, StatsSnapshot};
use crate::tokenize;
use crate::url_utils;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

/// One fetched page as handed over by the crawler framework.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested.
    pub url: String,
    /// The final URL after any server-side redirect.
    pub final_url: String,
    /// HTTP status returned by the server.
    pub status: u16,
    /// Declared Content-Length, when the server sent one.
    pub content_length: Option<u64>,
    /// Raw response body, when one arrived.
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    /// A link reached the scope filter in a shape the filter cannot parse.
    /// Aborts this page's processing; sibling pages are unaffected.
    #[error("link filtering failed: {0}")]
    Filter(#[from] FilterError),
}

/// Orchestrates the gates over an owned [`CrawlState`].
#[derive(Debug, Default)]
pub struct PageProcessor {
    state: CrawlState,
}

impl PageProcessor {
    pub fn new() -> Self {
        Self {
            state: CrawlState::new(),
        }
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.state.snapshot()
    }

    /// Process one fetched page and return the canonical URLs to enqueue, in
    /// document discovery order.
    ///
    /// Every failure mode except a filter contract violation degrades to an
    /// empty list; the violation surfaces as `Err` after being logged, so the
    /// embedder can drop the page and carry on.
    pub fn process(&mut self, page: &FetchedPage) -> Result<Vec<String>, ProcessError> {
        let mut base = page.url.as_str();
        let mut hops = 0u32;

        loop {
            match page.status {
                200 => return self.process_body(base, page),
                status if (300..400).contains(&status) => {
                    // Re-enter with the redirect target as the new base,
                    // bounded by hop count and rejecting outright when the
                    // target makes no progress. The unbounded variant of
                    // this walk recurses forever on a redirect cycle.
                    if hops >= Config::MAX_REDIRECT_HOPS || page.final_url == base {
                        debug!(url = base, status, hops, "redirect rejected");
                        return Ok(Vec::new());
                    }
                    hops += 1;
                    base = page.final_url.as_str();
                }
                status => {
                    debug!(url = base, status, "non-success status, page skipped");
                    return Ok(Vec::new());
                }
            }
        }
    }

    /// Process one page and queue a fresh analytics snapshot with `writer`,
    /// so the exported files track the crawl page by page. The snapshot is
    /// submitted whatever the processing outcome; the analytics files are
    /// rewritten after every call.
    pub fn process_with_export(
        &mut self,
        page: &FetchedPage,
        writer: &crate::snapshots::SnapshotWriter,
    ) -> Result<Vec<String>, ProcessError> {
        let result = self.process(page);
        writer.submit(self.snapshot());
        result
    }

    fn process_body(&mut self, base: &str, page: &FetchedPage) -> Result<Vec<String>, ProcessError> {
        let Some(body) = page.body.as_deref().filter(|b| !b.is_empty()) else {
            debug!(url = base, "empty body, page skipped");
            return Ok(Vec::new());
        };

        let Ok(decoded) = std::str::from_utf8(body) else {
            debug!(url = base, "body is not valid UTF-8, page skipped");
            return Ok(Vec::new());
        };

        let text = parser::extract_text(decoded);

        // Quality gates in order: low-information, size, duplicate. A page
        // failing any of them contributes nothing to the aggregates (the
        // duplicate check itself records a fingerprint on first sight).
        if tokenize::word_char_runs(&text) < Config::MIN_PAGE_TOKENS {
            debug!(url = base, "low-information page skipped");
            return Ok(Vec::new());
        }
        if page
            .content_length
            .is_some_and(|len| len >= Config::MAX_CONTENT_LENGTH)
        {
            debug!(url = base, length = page.content_length, "oversized page skipped");
            return Ok(Vec::new());
        }
        if self.state.is_duplicate_content(&text) {
            debug!(url = base, "duplicate content skipped");
            return Ok(Vec::new());
        }

        self.state.record_page(base, &text);

        let mut accepted = Vec::new();
        for href in parser::extract_links(decoded) {
            let Some(resolved) = url_utils::normalize(base, &href) else {
                continue;
            };

            // The uniqueness gate runs first and owns its side effects; the
            // scope filter is only consulted for URLs admitted as new.
            if !self.state.admit_if_new(&resolved) {
                continue;
            }
            match filters::is_acceptable(resolved.as_str(), self.state.patterns_mut()) {
                Ok(true) => accepted.push(resolved.to_string()),
                Ok(false) => {}
                Err(e) => {
                    error!(url = base, link = resolved.as_str(), error = %e,
                        "filter contract violation, aborting page");
                    return Err(e.into());
                }
            }
        }

        debug!(url = base, links = accepted.len(), "page processed");
        Ok(accepted)
    }
}

/// Clone-able handle serializing all processing through one lock, for
/// embedders that feed pages from multiple fetch workers. Check-then-update
/// sequences in the gates are not atomic on their own; the lock makes the
/// whole page the critical section.
#[derive(Clone, Default)]
pub struct SharedProcessor {
    inner: Arc<Mutex<PageProcessor>>,
}

impl SharedProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&self, page: &FetchedPage) -> Result<Vec<String>, ProcessError> {
        self.inner.lock().process(page)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.inner.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_ok(url: &str, body: &str) -> FetchedPage {
        FetchedPage {
            url: url.to_string(),
            final_url: url.to_string(),
            status: 200,
            content_length: Some(body.len() as u64),
            body: Some(body.as_bytes().to_vec()),
        }
    }

    // Enough filler text to clear the low-information gate.
    fn filler(words: usize) -> String {
        (0..words)
            .map(|i| format!("filler{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn rich_page(url: &str, links: &[&str]) -> FetchedPage {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<a href="{href}">link</a>"#))
            .collect();
        let body = format!(
            "<html><body><p>{}</p>{}</body></html>",
            filler(120),
            anchors
        );
        page_ok(url, &body)
    }

    #[test]
    fn test_non_success_status_rejected() {
        let mut processor = PageProcessor::new();
        for status in [404, 403, 500, 503] {
            let page = FetchedPage {
                status,
                ..page_ok("https://www.ics.uci.edu/", "<html></html>")
            };
            assert!(processor.process(&page).unwrap().is_empty());
        }
    }

    #[test]
    fn test_empty_and_missing_body_rejected() {
        let mut processor = PageProcessor::new();
        let mut page = page_ok("https://www.ics.uci.edu/", "");
        assert!(processor.process(&page).unwrap().is_empty());

        page.body = None;
        assert!(processor.process(&page).unwrap().is_empty());
    }

    #[test]
    fn test_undecodable_body_rejected() {
        let mut processor = PageProcessor::new();
        let page = FetchedPage {
            body: Some(vec![0xff, 0xfe, 0x80, 0x81]),
            ..page_ok("https://www.ics.uci.edu/", "x")
        };
        assert!(processor.process(&page).unwrap().is_empty());
    }

    #[test]
    fn test_accepts_in_scope_links() {
        let mut processor = PageProcessor::new();
        let page = rich_page(
            "https://www.ics.uci.edu/",
            &["/a", "https://www.cs.uci.edu/b", "https://example.com/off-scope"],
        );
        let links = processor.process(&page).unwrap();
        assert_eq!(
            links,
            vec![
                "https://www.ics.uci.edu/a",
                "https://www.cs.uci.edu/b",
            ]
        );
    }

    #[test]
    fn test_low_information_page_contributes_nothing() {
        let mut processor = PageProcessor::new();
        let body = r#"<html><body><p>tiny page</p>
            <a href="/a">a</a><a href="/b">b</a></body></html>"#;
        let page = page_ok("https://www.ics.uci.edu/", body);

        assert!(processor.process(&page).unwrap().is_empty());
        assert_eq!(processor.state().unique_url_count(), 0);
        assert_eq!(processor.state().longest_page().words, 0);
        assert_eq!(processor.snapshot().top_words.len(), 0);
    }

    #[test]
    fn test_oversized_page_rejected_by_declared_length() {
        let mut processor = PageProcessor::new();
        let mut page = rich_page("https://www.ics.uci.edu/", &["/a"]);
        page.content_length = Some(1_000_000);
        assert!(processor.process(&page).unwrap().is_empty());
        assert_eq!(processor.state().unique_url_count(), 0);

        // Just under the limit passes
        page.content_length = Some(999_999);
        assert!(!processor.process(&page).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_page_rejected_on_second_sight() {
        let mut processor = PageProcessor::new();
        let first = rich_page("https://www.ics.uci.edu/one", &["/a"]);
        let second = rich_page("https://www.ics.uci.edu/two", &["/a"]);

        assert!(!processor.process(&first).unwrap().is_empty());
        // Same body text from a different URL is a duplicate
        assert!(processor.process(&second).unwrap().is_empty());
    }

    #[test]
    fn test_redirect_bounded_and_fails_closed() {
        let mut processor = PageProcessor::new();

        // Redirect to a distinct target: no progress is possible with the
        // same response, so the page rejects without infinite re-entry.
        let page = FetchedPage {
            url: "https://www.ics.uci.edu/old".to_string(),
            final_url: "https://www.ics.uci.edu/new".to_string(),
            status: 301,
            content_length: None,
            body: Some(b"<html></html>".to_vec()),
        };
        assert!(processor.process(&page).unwrap().is_empty());

        // Redirect onto itself rejects immediately
        let cycle = FetchedPage {
            final_url: "https://www.ics.uci.edu/old".to_string(),
            ..page.clone()
        };
        assert!(processor.process(&cycle).unwrap().is_empty());
    }

    #[test]
    fn test_links_returned_in_document_order() {
        let mut processor = PageProcessor::new();
        let page = rich_page(
            "https://www.ics.uci.edu/",
            &["/zeta", "/alpha", "/mid"],
        );
        let links = processor.process(&page).unwrap();
        assert_eq!(
            links,
            vec![
                "https://www.ics.uci.edu/zeta",
                "https://www.ics.uci.edu/alpha",
                "https://www.ics.uci.edu/mid",
            ]
        );
    }

    #[test]
    fn test_shared_processor_counts_once() {
        let shared = SharedProcessor::new();
        let page = rich_page("https://www.ics.uci.edu/", &["/a"]);
        let other = shared.clone();
        assert_eq!(other.process(&page).unwrap().len(), 1);
        // The same link rediscovered on a different page is no longer unique
        let body = format!(
            r#"<html><body><p>fresh words {}</p><a href="/a">again</a></body></html>"#,
            filler(110)
        );
        let again = page_ok("https://www.ics.uci.edu/second", &body);
        assert!(shared.process(&again).unwrap().is_empty());
        assert_eq!(shared.snapshot().unique_url_count, 1);
    }
}
