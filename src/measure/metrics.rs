//! Page-load performance metrics
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five measured page-load metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Largest Contentful Paint (ms)
    Lcp,
    /// First Contentful Paint (ms)
    Fcp,
    /// Cumulative Layout Shift (unitless)
    Cls,
    /// Time to Interactive (ms)
    Tti,
    /// Total Blocking Time (ms)
    Tbt,
}

impl MetricKind {
    /// All metrics, in report column order
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Lcp,
        MetricKind::Fcp,
        MetricKind::Cls,
        MetricKind::Tti,
        MetricKind::Tbt,
    ];

    /// Short upper-case label ("LCP")
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lcp => "LCP",
            Self::Fcp => "FCP",
            Self::Cls => "CLS",
            Self::Tti => "TTI",
            Self::Tbt => "TBT",
        }
    }

    /// Spelled-out metric name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lcp => "Largest Contentful Paint",
            Self::Fcp => "First Contentful Paint",
            Self::Cls => "Cumulative Layout Shift",
            Self::Tti => "Time to Interactive",
            Self::Tbt => "Total Blocking Time",
        }
    }

    /// Unit suffix used when printing values
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Cls => "",
            _ => "ms",
        }
    }

    /// Formats a value of this metric for display
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Self::Cls => format!("{:.3}", value),
            _ => format!("{:.0}{}", value, self.unit()),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Measured metrics for one URL
///
/// `None` means the metric could not be measured. It is never coerced to
/// zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub lcp: Option<f64>,
    pub fcp: Option<f64>,
    pub cls: Option<f64>,
    pub tti: Option<f64>,
    pub tbt: Option<f64>,
}

impl PerformanceMetrics {
    /// Returns the value of a metric, if it was measured
    pub fn get(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::Lcp => self.lcp,
            MetricKind::Fcp => self.fcp,
            MetricKind::Cls => self.cls,
            MetricKind::Tti => self.tti,
            MetricKind::Tbt => self.tbt,
        }
    }

    /// Sets (or clears) the value of a metric
    pub fn set(&mut self, kind: MetricKind, value: Option<f64>) {
        let slot = match kind {
            MetricKind::Lcp => &mut self.lcp,
            MetricKind::Fcp => &mut self.fcp,
            MetricKind::Cls => &mut self.cls,
            MetricKind::Tti => &mut self.tti,
            MetricKind::Tbt => &mut self.tbt,
        };
        *slot = value;
    }

    /// Builder-style setter
    pub fn with(mut self, kind: MetricKind, value: f64) -> Self {
        self.set(kind, Some(value));
        self
    }

    /// Metrics that were not measured
    pub fn unavailable(&self) -> Vec<MetricKind> {
        MetricKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }

    /// Returns true if all five metrics were measured
    pub fn is_complete(&self) -> bool {
        MetricKind::ALL.iter().all(|kind| self.get(*kind).is_some())
    }
}
