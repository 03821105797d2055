use crate::discovery::extractor::{ExtractError, LinkExtractor};
use crate::url::{is_allowed_host, normalize_url, resolve_href};
use crate::{DiscoveryError, InputError, InputResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Default per-page fetch timeout during discovery
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounds and filters for a breadth-first crawl
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Maximum link distance from the seed (seed is depth 0)
    pub max_depth: u32,
    /// Maximum number of URLs in the result
    pub max_pages: usize,
    /// Host patterns a followed link must match; empty allows all
    pub allowed_domains: Vec<String>,
    /// Links whose normalized URL matches any of these are skipped
    pub exclude_patterns: Vec<Regex>,
    /// Upper bound for fetching a single page
    pub fetch_timeout: Duration,
}

impl DiscoveryConfig {
    pub fn new(max_depth: u32, max_pages: usize) -> Self {
        Self {
            max_depth,
            max_pages,
            allowed_domains: Vec::new(),
            exclude_patterns: Vec::new(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = domains;
        self
    }

    /// Compiles and sets the exclude patterns
    pub fn with_exclude_patterns(mut self, patterns: &[String]) -> InputResult<Self> {
        self.exclude_patterns = compile_patterns(patterns)?;
        Ok(self)
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    fn is_excluded(&self, url: &Url) -> bool {
        self.exclude_patterns.iter().any(|re| re.is_match(url.as_str()))
    }
}

/// Compiles user-supplied exclude patterns
pub fn compile_patterns(patterns: &[String]) -> InputResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| InputError::InvalidPattern(format!("{}: {}", p, e))))
        .collect()
}

/// A URL found during discovery and its BFS depth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredUrl {
    pub url: String,
    pub depth: u32,
}

/// Ordered, duplicate-free crawl output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryResult {
    /// URLs in the order they were visited
    pub urls: Vec<DiscoveredUrl>,
    /// Non-seed pages whose links could not be read
    pub failed_fetches: usize,
    /// True if cancellation stopped the crawl early
    pub interrupted: bool,
}

impl DiscoveryResult {
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Breadth-first link discoverer
///
/// Pages at depth `d` are all visited before any page at depth `d + 1`,
/// and every URL appears at most once, keyed by its normalized form.
#[derive(Clone)]
pub struct Discoverer {
    extractor: Arc<dyn LinkExtractor>,
}

impl Discoverer {
    pub fn new(extractor: Arc<dyn LinkExtractor>) -> Self {
        Self { extractor }
    }

    /// Crawls outward from `seed` within the bounds of `config`
    ///
    /// The seed is always included regardless of the domain filter. Its
    /// failure is the only fatal error; any other page that cannot be fetched
    /// is kept as a leaf. Cancellation is checked before every fetch and
    /// returns whatever was collected so far.
    pub async fn discover(
        &self,
        seed: &Url,
        config: &DiscoveryConfig,
        cancel: &CancellationToken,
    ) -> Result<DiscoveryResult, DiscoveryError> {
        let mut result = DiscoveryResult::default();
        if config.max_pages == 0 {
            return Ok(result);
        }

        let seed = normalize_url(seed.as_str()).unwrap_or_else(|_| seed.clone());
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(Url, u32)> = VecDeque::new();
        seen.insert(seed.as_str().to_string());
        queue.push_back((seed, 0));

        while let Some((url, depth)) = queue.pop_front() {
            if cancel.is_cancelled() {
                tracing::info!("Discovery cancelled after {} pages", result.len());
                result.interrupted = true;
                break;
            }
            if result.len() >= config.max_pages {
                break;
            }

            let links = match self.fetch_links(&url, config.fetch_timeout, cancel).await {
                Ok(links) => links,
                Err(FetchFailure::Cancelled) => {
                    result.interrupted = true;
                    break;
                }
                Err(failure) if depth == 0 => {
                    return Err(failure.into_seed_error(&url, config.fetch_timeout));
                }
                Err(failure) => {
                    tracing::warn!("Could not read links from {}: {}", url, failure);
                    result.failed_fetches += 1;
                    Vec::new()
                }
            };

            tracing::debug!("Discovered {} (depth {}, {} links)", url, depth, links.len());
            result.urls.push(DiscoveredUrl {
                url: url.to_string(),
                depth,
            });

            if depth >= config.max_depth {
                continue;
            }

            for href in links {
                // Every queued URL becomes a result, so the queue never needs
                // to hold more than the remaining page budget
                if result.len() + queue.len() >= config.max_pages {
                    break;
                }
                let Some(next) = self.accept_link(&href, &url, config) else {
                    continue;
                };
                if seen.insert(next.as_str().to_string()) {
                    queue.push_back((next, depth + 1));
                }
            }
        }

        tracing::info!(
            "Discovery finished: {} pages, {} unreadable",
            result.len(),
            result.failed_fetches
        );
        Ok(result)
    }

    async fn fetch_links(
        &self,
        url: &Url,
        fetch_timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, FetchFailure> {
        tokio::select! {
            _ = cancel.cancelled() => Err(FetchFailure::Cancelled),
            outcome = timeout(fetch_timeout, self.extractor.fetch_and_extract_links(url)) => {
                match outcome {
                    Ok(Ok(links)) => Ok(links),
                    Ok(Err(e)) => Err(FetchFailure::Extract(e)),
                    Err(_) => Err(FetchFailure::TimedOut),
                }
            }
        }
    }

    fn accept_link(&self, href: &str, base: &Url, config: &DiscoveryConfig) -> Option<Url> {
        let resolved = resolve_href(href, base)?;
        let normalized = normalize_url(resolved.as_str()).ok()?;
        let host = normalized.host_str()?;

        if !is_allowed_host(host, &config.allowed_domains) {
            return None;
        }
        if config.is_excluded(&normalized) {
            return None;
        }
        Some(normalized)
    }
}

#[derive(Debug)]
enum FetchFailure {
    Extract(ExtractError),
    TimedOut,
    Cancelled,
}

impl FetchFailure {
    fn into_seed_error(self, url: &Url, after: Duration) -> DiscoveryError {
        match self {
            FetchFailure::Extract(ExtractError::Timeout) | FetchFailure::TimedOut => {
                DiscoveryError::Timeout {
                    url: url.to_string(),
                    after,
                }
            }
            other => DiscoveryError::SeedUnreachable {
                url: url.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::Extract(e) => write!(f, "{}", e),
            FetchFailure::TimedOut => write!(f, "fetch timed out"),
            FetchFailure::Cancelled => write!(f, "cancelled"),
        }
    }
}
