use crate::analysis::ScoringWeights;
use crate::measure::{Device, MeasurementProfile, MetricKind, NetworkProfile};
use crate::output::ReportFormat;
use crate::task::{PipelineSettings, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Pagegauge
///
/// Every section is optional; a missing file or section means defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub measurement: MeasurementSettings,
    #[serde(default)]
    pub scoring: ScoringOverrides,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Pipeline tunables derived from the measurement, discovery and output sections
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            workers: self.measurement.workers,
            persist_timeout: Duration::from_millis(self.output.persist_timeout_ms),
            fetch_timeout: self.discovery.fetch_timeout(),
        }
    }
}

/// Crawl bounds and filters
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DiscoverySettings {
    /// Maximum link distance from the seed
    pub max_depth: u32,

    /// Maximum number of pages in the crawl result
    pub max_pages: usize,

    /// Time limit for fetching one page (milliseconds)
    pub fetch_timeout_ms: u64,

    /// Host patterns ("example.com" or "*.example.com") links must match
    pub allowed_domains: Vec<String>,

    /// Regular expressions; matching URLs are not crawled
    pub exclude_patterns: Vec<String>,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            fetch_timeout_ms: 10_000,
            allowed_domains: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl DiscoverySettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Emulation profile and measurement limits
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MeasurementSettings {
    pub device: Device,

    pub network: NetworkProfile,

    /// CPU slowdown multiplier (1.0 = none)
    pub cpu_throttle: f64,

    /// Time limit for one page measurement (milliseconds)
    pub timeout_ms: u64,

    /// Concurrent measurements per task
    pub workers: usize,
}

impl Default for MeasurementSettings {
    fn default() -> Self {
        Self {
            device: Device::Desktop,
            network: NetworkProfile::Unthrottled,
            cpu_throttle: 1.0,
            timeout_ms: 30_000,
            workers: 1,
        }
    }
}

impl MeasurementSettings {
    pub fn profile(&self) -> MeasurementProfile {
        MeasurementProfile {
            device: self.device,
            network: self.network,
            cpu_throttle: self.cpu_throttle,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Override for one metric's weight or threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricOverride {
    pub weight: Option<f64>,
    pub threshold: Option<f64>,
}

/// Optional per-metric scoring overrides
///
/// ```toml
/// [scoring.lcp]
/// weight = 0.3
/// threshold = 2000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringOverrides {
    pub lcp: Option<MetricOverride>,
    pub fcp: Option<MetricOverride>,
    pub cls: Option<MetricOverride>,
    pub tti: Option<MetricOverride>,
    pub tbt: Option<MetricOverride>,
}

impl ScoringOverrides {
    pub fn get(&self, kind: MetricKind) -> Option<&MetricOverride> {
        match kind {
            MetricKind::Lcp => self.lcp.as_ref(),
            MetricKind::Fcp => self.fcp.as_ref(),
            MetricKind::Cls => self.cls.as_ref(),
            MetricKind::Tti => self.tti.as_ref(),
            MetricKind::Tbt => self.tbt.as_ref(),
        }
    }

    /// Default weights with the overrides applied
    pub fn to_weights(&self) -> ScoringWeights {
        let mut weights = ScoringWeights::default();
        for kind in MetricKind::ALL {
            if let Some(o) = self.get(kind) {
                let params = weights.get_mut(kind);
                if let Some(weight) = o.weight {
                    params.weight = weight;
                }
                if let Some(threshold) = o.threshold {
                    params.threshold = threshold;
                }
            }
        }
        weights
    }
}

/// User agent identification for HTTP requests
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserAgentConfig {
    pub name: String,

    pub version: String,

    /// URL with information about the client
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "pagegauge".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.name, self.version, url),
            None => format!("{}/{}", self.name, self.version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// SQLite database for tasks, reports and logs
    pub database_path: PathBuf,

    /// Directory rendered reports are written to
    pub report_dir: PathBuf,

    pub formats: Vec<ReportFormat>,

    /// Time limit for one store write (milliseconds)
    pub persist_timeout_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("pagegauge.db"),
            report_dir: PathBuf::from("reports"),
            formats: vec![ReportFormat::Markdown, ReportFormat::Json],
            persist_timeout_ms: 5_000,
        }
    }
}
