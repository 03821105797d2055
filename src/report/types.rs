use crate::analysis::ScoredResult;
use crate::discovery::DiscoveredUrl;
use crate::measure::MeasurementProfile;
use crate::task::{TaskId, TaskMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A URL whose measurement failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUrl {
    pub url: String,
    pub reason: String,
    /// True if the failure was a timeout rather than an explicit error
    #[serde(default)]
    pub timed_out: bool,
}

impl FailedUrl {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
            timed_out: false,
        }
    }

    pub fn timed_out(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            timed_out: true,
            ..Self::new(url, reason)
        }
    }
}

/// Aggregated outcome of one task
///
/// Every discovered URL is accounted for exactly once across `results`,
/// `failures` and `skipped`. `skipped` is only non-empty for a task that
/// was cancelled before measuring everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub task_id: TaskId,
    pub mode: TaskMode,
    pub generated_at: DateTime<Utc>,
    /// Crawl mode only
    pub seed_url: Option<String>,
    pub profile: MeasurementProfile,
    pub discovered_urls: Vec<DiscoveredUrl>,
    /// Sorted by descending score, ties in discovery order
    pub results: Vec<ScoredResult>,
    pub failures: Vec<FailedUrl>,
    #[serde(default)]
    pub skipped: Vec<String>,
}

impl Report {
    /// Returns true if measurement stopped before every URL was processed
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// Number of URLs either measured or failed
    pub fn processed(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    /// Checks that every discovered URL appears in exactly one bucket
    pub fn is_fully_accounted(&self) -> bool {
        self.processed() + self.skipped.len() == self.discovered_urls.len()
    }

    /// Lowest-scoring result, if any
    pub fn worst(&self) -> Option<&ScoredResult> {
        self.results.last()
    }
}
