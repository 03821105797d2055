//! HTML link extraction
//!
//! # Link Extraction Rules
//!
//! **Include:**
//! - `<a href="...">`
//! - `<link rel="canonical" href="...">`
//!
//! **Exclude:**
//! - `<a href="..." download>`
//! - `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only links
//! - anything that does not resolve to http(s)

use crate::url::resolve_href;
use scraper::{Html, Selector};
use url::Url;

/// Extracts absolute link targets from an HTML document
///
/// # Example
///
/// ```
/// use pagegauge::discovery::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// assert_eq!(extract_links(html, &base), vec!["https://example.com/page".to_string()]);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_href(href, base_url))
            {
                links.push(url.to_string());
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_href(href, base_url))
            {
                links.push(url.to_string());
            }
        }
    }

    links
}
