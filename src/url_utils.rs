//! URL utilities for consistent link handling across modules.

use url::Url;

/// Resolve an href against the page it was found on and strip the fragment,
/// producing the canonical form used for uniqueness everywhere else.
///
/// Returns `None` when the href is absent/empty or when resolution fails
/// (malformed base or relative part). No side effects.
pub fn normalize(base_url: &str, href: &str) -> Option<Url> {
    let trimmed = href.trim();
    if trimmed.is_empty() {
        return None;
    }

    let base = Url::parse(base_url).ok()?;
    let mut resolved = base.join(trimmed).ok()?;
    // Fragments are client-side only; two URLs differing only by fragment
    // must canonicalize identically.
    resolved.set_fragment(None);
    Some(resolved)
}

pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Pattern key for trap detection: scheme + host + path, query and fragment
/// stripped. Distinct query strings on the same path share one key.
pub fn pattern_key(url: &Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or(""),
        url.path()
    )
}

pub fn is_http_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
