//! Browserless HTTP probe
//!
//! `HttpProbe` is a page-load capability that needs no rendering engine. It
//! times a plain GET of the document:
//!
//! | Metric | Source |
//! |--------|--------|
//! | FCP | time until response headers arrive |
//! | LCP | time until the body is fully downloaded |
//! | TTI, TBT, CLS | not available (need script execution and layout) |
//!
//! Device emulation is limited to the user agent. Network and CPU throttling
//! cannot be applied at this level and are ignored.

use crate::measure::{
    CapabilityError, MeasurementProfile, MetricKind, PageLoadCapability, PageSession,
};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::time::{Duration, Instant};
use url::Url;

/// Timings captured by one navigation
#[derive(Debug, Clone, Copy)]
struct LoadTiming {
    headers: Duration,
    complete: Duration,
}

/// HTTP-level page-load capability
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    /// Builds a probe whose requests give up after `request_timeout`
    pub fn new(request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(request_timeout.min(Duration::from_secs(10)))
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageLoadCapability for HttpProbe {
    async fn open_session(&self) -> Result<Box<dyn PageSession>, CapabilityError> {
        Ok(Box::new(HttpProbeSession {
            client: self.client.clone(),
            timing: None,
        }))
    }
}

struct HttpProbeSession {
    client: Client,
    timing: Option<LoadTiming>,
}

#[async_trait]
impl PageSession for HttpProbeSession {
    async fn navigate(
        &mut self,
        url: &Url,
        profile: &MeasurementProfile,
    ) -> Result<(), CapabilityError> {
        if profile.network.download_kbps().is_some() || profile.cpu_throttle > 1.0 {
            tracing::debug!(
                "HTTP probe cannot emulate {}; measuring unthrottled",
                profile
            );
        }

        let start = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, profile.device.user_agent())
            .send()
            .await
            .map_err(|e| request_error(&e))?;
        let headers = start.elapsed();

        let status = response.status();
        if !status.is_success() {
            return Err(CapabilityError::Navigation(format!("HTTP {}", status.as_u16())));
        }

        response
            .bytes()
            .await
            .map_err(|e| request_error(&e))?;
        let complete = start.elapsed();

        self.timing = Some(LoadTiming { headers, complete });
        Ok(())
    }

    async fn collect_metric(&mut self, metric: MetricKind) -> Result<Option<f64>, CapabilityError> {
        let timing = self.timing.ok_or(CapabilityError::NotLoaded)?;

        let value = match metric {
            MetricKind::Fcp => Some(as_millis(timing.headers)),
            MetricKind::Lcp => Some(as_millis(timing.complete)),
            MetricKind::Tti | MetricKind::Tbt | MetricKind::Cls => None,
        };
        Ok(value)
    }
}

fn as_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

fn request_error(error: &reqwest::Error) -> CapabilityError {
    if error.is_timeout() {
        CapabilityError::TimedOut
    } else if error.is_connect() {
        CapabilityError::Navigation("connection refused".to_string())
    } else {
        CapabilityError::Navigation(error.to_string())
    }
}
