//! Pagegauge: a page-load performance audit engine
//!
//! This crate discovers the pages of a site (or takes an explicit URL list),
//! measures each page's load performance through a pluggable page-load
//! capability, scores the results and builds a report, all inside a
//! cancellable, observable task.

pub mod analysis;
pub mod channel;
pub mod config;
pub mod discovery;
pub mod measure;
pub mod output;
pub mod report;
pub mod state;
pub mod storage;
pub mod task;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for Pagegauge operations
#[derive(Debug, Error)]
pub enum GaugeError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Measurement error: {0}")]
    Measurement(#[from] MeasurementError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Task error: {0}")]
    Task(#[from] OrchestratorError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while validating a submission or a configuration file
///
/// A task is never created when its submission fails validation.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Errors that stop link discovery as a whole
///
/// Failures on individual non-seed pages never surface here; they are
/// logged and the page is kept as a leaf.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Seed URL {url} is unreachable: {reason}")]
    SeedUnreachable { url: String, reason: String },

    #[error("Seed URL {url} did not respond within {after:?}")]
    Timeout { url: String, after: Duration },
}

impl DiscoveryError {
    /// Returns true if the failure was a timeout rather than an explicit error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Failure to measure a single URL
#[derive(Debug, Error)]
pub enum MeasurementError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Measurement of {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("Page-load capability unavailable: {0}")]
    Capability(String),
}

impl MeasurementError {
    /// Returns true if the failure was a timeout rather than an explicit error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Synchronous errors returned by orchestrator commands and queries
///
/// These never change the state of the task they refer to.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Task not found: {0}")]
    NotFound(task::TaskId),

    #[error("Task {task_id} is {status}, operation not allowed")]
    InvalidState {
        task_id: task::TaskId,
        status: state::TaskStatus,
    },

    #[error("Report for task {task_id} is not ready (task is {status})")]
    NotReady {
        task_id: task::TaskId,
        status: state::TaskStatus,
    },

    #[error("Invalid submission: {0}")]
    Input(#[from] InputError),
}

/// Result type alias for Pagegauge operations
pub type Result<T> = std::result::Result<T, GaugeError>;

/// Result type alias for input validation
pub type InputResult<T> = std::result::Result<T, InputError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analysis::{score_metrics, Analyzer, Grade, ScoredResult, ScoringWeights};
pub use channel::{BroadcastChannel, ProgressEvent, ProgressSink};
pub use config::Config;
pub use discovery::{DiscoveredUrl, DiscoveryConfig, DiscoveryResult, Discoverer, LinkExtractor};
pub use measure::{MeasurementProfile, MeasurementRunner, PageLoadCapability, PerformanceMetrics};
pub use report::{build_report, FailedUrl, Report};
pub use state::{LogEntry, LogLevel, ProgressState, TaskStatus};
pub use storage::{MemoryStore, SqliteStore, TaskStore};
pub use task::{Orchestrator, SubmitRequest, Task, TaskConfig, TaskId, TaskMode};
pub use crate::url::{extract_domain, matches_domain, normalize_url};
