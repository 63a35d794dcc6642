//! Exact-content deduplication via fixed-size fingerprints.

use md5::{Digest, Md5};
use std::collections::HashSet;

/// 128-bit digest of a page's extracted text.
pub type Fingerprint = [u8; 16];

/// Digest the exact UTF-8 bytes of `text`. No whitespace or case
/// normalization happens first: two pages whose visible text matches but
/// whose extracted text differs structurally hash differently, a known
/// limitation of the scheme.
pub fn fingerprint(text: &str) -> Fingerprint {
    Md5::digest(text.as_bytes()).into()
}

/// Monotonically growing set of content fingerprints. Membership is exact;
/// digest collisions are a rare, accepted trade-off of the hash choice.
#[derive(Debug, Default)]
pub struct ContentDedup {
    seen: HashSet<Fingerprint>,
}

impl ContentDedup {
    pub fn new() -> Self {
        Self::default()
    }

    /// First sighting inserts the fingerprint and returns `false`; any later
    /// sighting of the same text returns `true` (duplicate, discard page).
    pub fn is_duplicate(&mut self, text: &str) -> bool {
        let fp = fingerprint(text);
        if self.seen.contains(&fp) {
            true
        } else {
            self.seen.insert(fp);
            false
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
