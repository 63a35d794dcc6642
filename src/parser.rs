//! HTML parsing: hyperlink and plain-text extraction.

use scraper::{Html, Selector};

/// Extract raw href values from `<a>` tags in document order.
///
/// Hrefs are trimmed; empty values and non-fetchable pseudo-schemes are
/// skipped here so downstream gates only see candidate page links.
pub fn extract_links(html_body: &str) -> Vec<String> {
    let document = Html::parse_document(html_body);
    let selector = Selector::parse("a[href]").expect("Invalid CSS selector");

    let mut links = Vec::new();

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            let cleaned = href.trim();

            if !cleaned.is_empty()
                && !cleaned.starts_with("javascript:")
                && !cleaned.starts_with("mailto:")
                && !cleaned.starts_with("tel:")
                && !cleaned.starts_with("data:")
            {
                links.push(cleaned.to_string());
            }
        }
    }

    links
}

/// Extract the page's visible text: every text node trimmed, empties
/// dropped, the rest joined with single spaces.
pub fn extract_text(html_body: &str) -> String {
    let document = Html::parse_document(html_body);
    document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
