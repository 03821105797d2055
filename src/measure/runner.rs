//! Measurement runner
//!
//! Drives the page-load capability for one URL under a single timeout that
//! covers session setup, navigation and all metric collection.

use crate::measure::{CapabilityError, MeasurementProfile, PageLoadCapability, PerformanceMetrics};
use crate::MeasurementError;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default time budget for one measurement
pub const DEFAULT_MEASUREMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Measures page-load performance for one URL at a time
#[derive(Clone)]
pub struct MeasurementRunner {
    capability: Arc<dyn PageLoadCapability>,
    timeout: Duration,
}

impl MeasurementRunner {
    /// Creates a runner over a capability with the given per-call timeout
    pub fn new(capability: Arc<dyn PageLoadCapability>, timeout: Duration) -> Self {
        Self {
            capability,
            timeout,
        }
    }

    /// Returns the per-call timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Measures `url` under `profile`
    ///
    /// # Returns
    ///
    /// * `Ok(PerformanceMetrics)` - Navigation succeeded; individual metrics may be absent
    /// * `Err(MeasurementError::Navigation)` - The page could not be loaded
    /// * `Err(MeasurementError::Timeout)` - The whole call exceeded the timeout
    /// * `Err(MeasurementError::Capability)` - No page session could be opened
    pub async fn measure(
        &self,
        url: &Url,
        profile: &MeasurementProfile,
    ) -> Result<PerformanceMetrics, MeasurementError> {
        tracing::debug!("Measuring {} ({})", url, profile);

        match tokio::time::timeout(self.timeout, self.measure_untimed(url, profile)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Measurement of {} timed out after {:?}", url, self.timeout);
                Err(MeasurementError::Timeout {
                    url: url.to_string(),
                    after: self.timeout,
                })
            }
        }
    }

    async fn measure_untimed(
        &self,
        url: &Url,
        profile: &MeasurementProfile,
    ) -> Result<PerformanceMetrics, MeasurementError> {
        let mut session = self
            .capability
            .open_session()
            .await
            .map_err(|e| MeasurementError::Capability(e.to_string()))?;

        session
            .navigate(url, profile)
            .await
            .map_err(|e| match e {
                CapabilityError::Navigation(reason) => MeasurementError::Navigation {
                    url: url.to_string(),
                    reason,
                },
                CapabilityError::TimedOut => MeasurementError::Timeout {
                    url: url.to_string(),
                    after: self.timeout,
                },
                other => MeasurementError::Navigation {
                    url: url.to_string(),
                    reason: other.to_string(),
                },
            })?;

        let metrics = session.collect_metrics().await;

        let missing = metrics.unavailable();
        if !missing.is_empty() {
            tracing::debug!("{}: metrics not available: {:?}", url, missing);
        }

        Ok(metrics)
    }
}
