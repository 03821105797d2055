//! Page-load capability port
//!
//! The capability abstracts a controllable browser. The core never looks
//! inside it: it opens a session, navigates, and asks for metrics.

use crate::measure::{MeasurementProfile, MetricKind, PerformanceMetrics};
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Errors reported by a page-load capability
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("metric {0} is not supported")]
    Unsupported(MetricKind),

    #[error("no page has been loaded in this session")]
    NotLoaded,

    #[error("page did not load in time")]
    TimedOut,
}

/// Factory for isolated page sessions
///
/// Implementations must be shareable across tasks; each measurement opens
/// its own session so concurrent measurements never share page state.
#[async_trait]
pub trait PageLoadCapability: Send + Sync {
    /// Opens a fresh page context (a browser tab, a connection, ...)
    async fn open_session(&self) -> Result<Box<dyn PageSession>, CapabilityError>;
}

/// A single page context
#[async_trait]
pub trait PageSession: Send {
    /// Navigates to `url` under the given emulation and waits for load complete
    async fn navigate(
        &mut self,
        url: &Url,
        profile: &MeasurementProfile,
    ) -> Result<(), CapabilityError>;

    /// Reads one metric from the loaded page
    ///
    /// `Ok(None)` means the metric is not available for this page.
    async fn collect_metric(&mut self, metric: MetricKind) -> Result<Option<f64>, CapabilityError>;

    /// Reads all five metrics
    ///
    /// Each metric is collected independently: a failing or unsupported
    /// metric is left as not available and never fails the whole call.
    async fn collect_metrics(&mut self) -> PerformanceMetrics {
        let mut metrics = PerformanceMetrics::default();

        for kind in MetricKind::ALL {
            match self.collect_metric(kind).await {
                Ok(Some(value)) if value.is_finite() && value >= 0.0 => {
                    metrics.set(kind, Some(value));
                }
                Ok(Some(value)) => {
                    tracing::warn!("Discarding invalid {} value {}", kind, value);
                }
                Ok(None) => {
                    tracing::debug!("{} not available", kind);
                }
                Err(e) => {
                    tracing::debug!("Failed to collect {}: {}", kind, e);
                }
            }
        }

        metrics
    }
}
