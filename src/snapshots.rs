//! Analytics snapshot persistence.
//!
//! Every export rewrites the files in full rather than appending, so a crash
//! mid-crawl leaves the last complete snapshot on disk. The synchronous
//! [`write_all`] covers single-threaded embedders; [`SnapshotWriter`] moves
//! the rewrites onto a dedicated task so page processing never blocks on
//! disk.

use crate::state::StatsSnapshot;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

pub const UNIQUE_URL_FILE: &str = "unique_url.txt";
pub const LONGEST_PAGE_FILE: &str = "longest_page.txt";
pub const TOP_WORDS_FILE: &str = "top50.txt";
pub const SUBDOMAIN_FILE: &str = "subdomain.txt";
pub const REPORT_FILE: &str = "report.json";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Rewrite all snapshot files under `dir`.
pub fn write_all(dir: &Path, snapshot: &StatsSnapshot) -> Result<(), SnapshotError> {
    std::fs::create_dir_all(dir)?;
    write_unique_count(dir, snapshot)?;
    write_longest_page(dir, snapshot)?;
    write_top_words(dir, snapshot)?;
    write_subdomains(dir, snapshot)?;
    write_report(dir, snapshot)?;
    Ok(())
}

/// Single integer line: the unique-URL count.
fn write_unique_count(dir: &Path, snapshot: &StatsSnapshot) -> Result<(), SnapshotError> {
    let mut file = BufWriter::new(File::create(dir.join(UNIQUE_URL_FILE))?);
    writeln!(file, "{}", snapshot.unique_url_count)?;
    Ok(())
}

/// Single `<url>:<word_count>` line; the URL part is empty until a page has
/// been recorded.
fn write_longest_page(dir: &Path, snapshot: &StatsSnapshot) -> Result<(), SnapshotError> {
    let mut file = BufWriter::new(File::create(dir.join(LONGEST_PAGE_FILE))?);
    writeln!(
        file,
        "{}:{}",
        snapshot.longest_page.url, snapshot.longest_page.words
    )?;
    Ok(())
}

/// Up to 50 `<token>:<count>` lines, descending count, ties by first-seen
/// order (already encoded in the snapshot).
fn write_top_words(dir: &Path, snapshot: &StatsSnapshot) -> Result<(), SnapshotError> {
    let mut file = BufWriter::new(File::create(dir.join(TOP_WORDS_FILE))?);
    for (token, count) in &snapshot.top_words {
        writeln!(file, "{token}:{count}")?;
    }
    Ok(())
}

/// `<host>:<unique_page_count>` lines sorted lexicographically by host.
fn write_subdomains(dir: &Path, snapshot: &StatsSnapshot) -> Result<(), SnapshotError> {
    let mut file = BufWriter::new(File::create(dir.join(SUBDOMAIN_FILE))?);
    for (host, count) in &snapshot.subdomains {
        writeln!(file, "{host}:{count}")?;
    }
    Ok(())
}

/// Combined machine-readable report.
fn write_report(dir: &Path, snapshot: &StatsSnapshot) -> Result<(), SnapshotError> {
    let mut file = BufWriter::new(File::create(dir.join(REPORT_FILE))?);
    serde_json::to_writer_pretty(&mut file, snapshot)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Handle for the background snapshot task. Submissions never block; the
/// task collapses any backlog and writes only the newest snapshot, since
/// rewrites are idempotent and only the latest state matters.
pub struct SnapshotWriter {
    tx: mpsc::UnboundedSender<StatsSnapshot>,
    handle: JoinHandle<()>,
}

impl SnapshotWriter {
    /// Spawn the writer task on the current tokio runtime.
    pub fn spawn(dir: PathBuf) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<StatsSnapshot>();

        let handle = tokio::spawn(async move {
            while let Some(mut snapshot) = rx.recv().await {
                // Drain anything queued behind this one; full rewrites make
                // intermediate snapshots redundant.
                while let Ok(newer) = rx.try_recv() {
                    snapshot = newer;
                }
                if let Err(e) = write_all(&dir, &snapshot) {
                    warn!(error = %e, dir = %dir.display(), "snapshot write failed");
                }
            }
        });

        Self { tx, handle }
    }

    /// Queue a snapshot for writing. Returns `false` after shutdown.
    pub fn submit(&self, snapshot: StatsSnapshot) -> bool {
        self.tx.send(snapshot).is_ok()
    }

    /// Close the channel and wait for the final rewrite to land.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "snapshot writer task failed");
        }
    }
}
