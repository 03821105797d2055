/// Checks if a host matches a domain pattern
///
/// Two kinds of patterns are supported:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches the bare domain and any
///    subdomain ("blog.example.com", "api.v2.example.com")
///
/// Matching is case-insensitive.
///
/// # Examples
///
/// ```
/// use pagegauge::url::matches_domain;
///
/// assert!(matches_domain("example.com", "example.com"));
/// assert!(!matches_domain("example.com", "blog.example.com"));
/// assert!(matches_domain("*.example.com", "blog.example.com"));
/// assert!(!matches_domain("*.example.com", "example.org"));
/// ```
pub fn matches_domain(pattern: &str, host: &str) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();
    let host = host.to_ascii_lowercase();

    if let Some(base) = pattern.strip_prefix("*.") {
        host == base || host.ends_with(&format!(".{}", base))
    } else {
        host == pattern
    }
}

/// Returns true if `host` matches any of the allowed domain patterns
///
/// An empty pattern list allows every host.
pub fn is_allowed_host(host: &str, allowed: &[String]) -> bool {
    allowed.is_empty() || allowed.iter().any(|pattern| matches_domain(pattern, host))
}
