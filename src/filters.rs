//! Scope & trap filtering for candidate links.
//!
//! Four independent gates, all of which must pass: scheme, extension
//! deny-list, exclusion rules, and the repeating-pattern trap gate. Cheap
//! gates run first; the trap gate runs last so only URLs surviving the other
//! gates touch the pattern log.

use crate::config::Config;
use crate::state::PatternLog;
use crate::url_utils;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use url::Url;

/// Non-HTML binary/document/archive/media formats never worth fetching.
const DISALLOWED_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".bmp", ".gif", ".jpg", ".jpeg", ".ico", ".png", ".tif",
    ".tiff", ".mid", ".mp2", ".mp3", ".mp4", ".wav", ".avi", ".mov", ".mpeg",
    ".ram", ".m4v", ".mkv", ".ogg", ".ogv", ".pdf", ".ps", ".eps", ".tex",
    ".ppt", ".pptx", ".doc", ".docx", ".xls", ".xlsx", ".names", ".data",
    ".dat", ".exe", ".bz2", ".tar", ".msi", ".bin", ".7z", ".psd", ".dmg",
    ".iso", ".epub", ".dll", ".cnf", ".tgz", ".sha1", ".thmx", ".mso",
    ".arff", ".rtf", ".jar", ".csv", ".rm", ".smil", ".wmv", ".swf", ".wma",
    ".zip", ".rar", ".gz", ".img", ".apk", ".sql", ".war", ".ppsx",
];

lazy_static! {
    // Calendar/event listings with embedded dates walk forever.
    static ref EVENT_DATE_PATH: Regex =
        Regex::new(r"^/events.*\d{4}-\d{2}.*$").expect("Invalid event-path regex");
}

#[derive(Debug, Error)]
pub enum FilterError {
    /// The caller handed the filter a string that is not a URL. Links reach
    /// this filter only after normalization, so this is a programming-contract
    /// violation, not a crawl condition.
    #[error("unparsable URL reached the scope filter: {0}")]
    UnparsableUrl(String),
}

/// Decide whether a canonical URL is worth crawling.
///
/// The trap gate increments the pattern log on every evaluation that reaches
/// it, including evaluations that end up rejected, so callers must evaluate
/// each discovered link exactly once per page.
pub fn is_acceptable(url: &str, patterns: &mut PatternLog) -> Result<bool, FilterError> {
    let parsed =
        Url::parse(url).map_err(|_| FilterError::UnparsableUrl(url.to_string()))?;

    if !url_utils::is_http_scheme(&parsed) {
        return Ok(false);
    }
    if has_disallowed_extension(&parsed) {
        return Ok(false);
    }
    if is_excluded(&parsed) {
        return Ok(false);
    }
    Ok(!is_trap(&parsed, patterns))
}

/// Extension gate: case-insensitive match on the path's trailing extension.
fn has_disallowed_extension(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    DISALLOWED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Exclusion gate: calendar/event listing paths, excluded hosts, and the
/// dynamic-doc prefix.
fn is_excluded(url: &Url) -> bool {
    let path = url.path();

    if EVENT_DATE_PATH.is_match(path)
        || path.starts_with("/events/week")
        || path.starts_with("/events/list")
    {
        return true;
    }

    if let Some(host) = url.host_str() {
        if Config::EXCLUDED_HOST_PREFIXES
            .iter()
            .any(|prefix| host.starts_with(prefix))
        {
            return true;
        }
    }

    path.starts_with(Config::EXCLUDED_PATH_PREFIX)
}

/// Trap gate: count this evaluation of the URL's path pattern and reject once
/// the pattern has been seen `TRAP_THRESHOLD` times. Query-string variants of
/// one path share a counter, which is what catches day-walking calendars and
/// paginated loops.
fn is_trap(url: &Url, patterns: &mut PatternLog) -> bool {
    patterns.observe(&url_utils::pattern_key(url)) >= Config::TRAP_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept(url: &str, patterns: &mut PatternLog) -> bool {
        is_acceptable(url, patterns).unwrap()
    }

    #[test]
    fn test_scheme_gate() {
        let mut patterns = PatternLog::new();
        assert!(accept("https://www.ics.uci.edu/page", &mut patterns));
        assert!(accept("http://www.ics.uci.edu/page", &mut patterns));
        assert!(!accept("ftp://www.ics.uci.edu/page", &mut patterns));
        assert!(!accept("mailto:someone@ics.uci.edu", &mut patterns));
    }

    #[test]
    fn test_extension_gate() {
        let mut patterns = PatternLog::new();
        assert!(!accept("https://www.ics.uci.edu/paper.pdf", &mut patterns));
        assert!(!accept("https://www.ics.uci.edu/Paper.PDF", &mut patterns));
        assert!(!accept("https://www.ics.uci.edu/pic.jpg", &mut patterns));
        assert!(!accept("https://www.ics.uci.edu/dump.sql", &mut patterns));
        assert!(!accept("https://www.ics.uci.edu/deck.ppsx", &mut patterns));
        // Extension only counts at the end of the path
        assert!(accept("https://www.ics.uci.edu/pdf-guide", &mut patterns));
        assert!(accept(
            "https://www.ics.uci.edu/archive.zip/listing",
            &mut patterns
        ));
    }

    #[test]
    fn test_extension_gate_ignores_query() {
        let mut patterns = PatternLog::new();
        // The deny-list applies to the path, not the query string
        assert!(accept("https://www.ics.uci.edu/view?file=x.pdf", &mut patterns));
    }

    #[test]
    fn test_exclusion_gate_event_paths() {
        let mut patterns = PatternLog::new();
        assert!(!accept(
            "https://www.ics.uci.edu/events/2023-04/day",
            &mut patterns
        ));
        assert!(!accept(
            "https://www.ics.uci.edu/events/week?date=now",
            &mut patterns
        ));
        assert!(!accept(
            "https://www.ics.uci.edu/events/list/page/2",
            &mut patterns
        ));
        // Plain event pages without a date component pass
        assert!(accept("https://www.ics.uci.edu/events", &mut patterns));
        // Date-bearing paths outside /events pass
        assert!(accept("https://www.ics.uci.edu/news/2023-04", &mut patterns));
    }

    #[test]
    fn test_exclusion_gate_hosts_and_doku() {
        let mut patterns = PatternLog::new();
        assert!(!accept("https://gitlab.ics.uci.edu/project", &mut patterns));
        assert!(!accept("https://archive.ics.uci.edu/ml", &mut patterns));
        assert!(!accept("https://www.cert.ics.uci.edu/", &mut patterns));
        assert!(!accept("https://www.ics.uci.edu/doku.php?id=x", &mut patterns));
        assert!(accept("https://www.ics.uci.edu/wiki", &mut patterns));
    }

    #[test]
    fn test_trap_gate_threshold() {
        let mut patterns = PatternLog::new();
        // Distinct query variants share one path pattern; 14 evaluations
        // pass, the 15th and every one after is rejected.
        for day in 1..=14 {
            let url = format!("https://x.ics.uci.edu/schedule?day={day}");
            assert!(accept(&url, &mut patterns), "evaluation {day} should pass");
        }
        assert!(!accept("https://x.ics.uci.edu/schedule?day=15", &mut patterns));
        assert!(!accept("https://x.ics.uci.edu/schedule?day=16", &mut patterns));
        // Other paths on the same host are unaffected
        assert!(accept("https://x.ics.uci.edu/people", &mut patterns));
    }

    #[test]
    fn test_trap_gate_not_reached_behind_cheaper_gates() {
        let mut patterns = PatternLog::new();
        assert!(!accept("https://www.ics.uci.edu/paper.pdf", &mut patterns));
        // The extension gate rejected first, so the pattern log is untouched
        assert_eq!(patterns.count("https://www.ics.uci.edu/paper.pdf"), 0);
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_unparsable_url_is_contract_violation() {
        let mut patterns = PatternLog::new();
        let err = is_acceptable("not a url at all", &mut patterns);
        assert!(matches!(err, Err(FilterError::UnparsableUrl(_))));
    }
}
