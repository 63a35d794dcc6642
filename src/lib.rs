pub mod config;
pub mod dedup;
pub mod filters;
pub mod logging;
pub mod parser;
pub mod processor;
pub mod snapshots;
pub mod state;
pub mod tokenize;
pub mod url_utils;

// Re-export main types for library usage
pub use config::Config;
pub use dedup::{ContentDedup, Fingerprint};
pub use filters::FilterError;
pub use processor::{FetchedPage, PageProcessor, ProcessError, SharedProcessor};
pub use snapshots::{SnapshotError, SnapshotWriter};
pub use state::{CrawlState, LongestPage, PatternLog, StatsSnapshot};
pub use url_utils::normalize;
