//! URL handling module
//!
//! Normalization (visited-set keys for discovery), host extraction and
//! allowed-domain matching.

mod domain;
mod matcher;
mod normalize;

pub use domain::extract_domain;
pub use matcher::{is_allowed_host, matches_domain};
pub use normalize::normalize_url;

use url::Url;

/// Resolves a possibly relative href against a base page URL
///
/// Returns `None` for hrefs that never lead to a measurable page:
/// `javascript:`, `mailto:`, `tel:` and `data:` links, fragment-only
/// anchors and anything that resolves to a non-HTTP(S) scheme.
pub fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    base.join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}
