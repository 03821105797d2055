use url::Url;

/// Extracts the lowercase host of a URL
///
/// Returns `None` for URLs without a host (which never survive
/// normalization for http/https).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use pagegauge::url::extract_domain;
///
/// let url = Url::parse("https://Docs.Example.COM:8443/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("docs.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
