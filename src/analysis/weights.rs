//! Per-metric weights and thresholds
use crate::measure::MetricKind;
use serde::{Deserialize, Serialize};

/// Scoring parameters for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricWeight {
    /// Share of the overall score (0.0-1.0)
    pub weight: f64,

    /// Values at or below this score full marks
    pub threshold: f64,

    /// Selects the steeper penalty slope used for unitless metrics (CLS)
    #[serde(default)]
    pub inverse: bool,
}

impl MetricWeight {
    pub const fn new(weight: f64, threshold: f64, inverse: bool) -> Self {
        Self {
            weight,
            threshold,
            inverse,
        }
    }
}

/// Weights and thresholds for all five metrics
///
/// Weights should sum to 1.0 for overall scores to land in 0-100. This is
/// not enforced here; see [`ScoringWeights::total_weight`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub lcp: MetricWeight,
    pub fcp: MetricWeight,
    pub cls: MetricWeight,
    pub tti: MetricWeight,
    pub tbt: MetricWeight,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            lcp: MetricWeight::new(0.25, 2500.0, false),
            fcp: MetricWeight::new(0.15, 1800.0, false),
            cls: MetricWeight::new(0.15, 0.1, true),
            tti: MetricWeight::new(0.25, 3500.0, false),
            tbt: MetricWeight::new(0.20, 300.0, false),
        }
    }
}

impl ScoringWeights {
    /// Returns the parameters of one metric
    pub fn get(&self, kind: MetricKind) -> MetricWeight {
        match kind {
            MetricKind::Lcp => self.lcp,
            MetricKind::Fcp => self.fcp,
            MetricKind::Cls => self.cls,
            MetricKind::Tti => self.tti,
            MetricKind::Tbt => self.tbt,
        }
    }

    /// Mutable access to the parameters of one metric
    pub fn get_mut(&mut self, kind: MetricKind) -> &mut MetricWeight {
        match kind {
            MetricKind::Lcp => &mut self.lcp,
            MetricKind::Fcp => &mut self.fcp,
            MetricKind::Cls => &mut self.cls,
            MetricKind::Tti => &mut self.tti,
            MetricKind::Tbt => &mut self.tbt,
        }
    }

    /// Sum of all five weights
    pub fn total_weight(&self) -> f64 {
        MetricKind::ALL.iter().map(|kind| self.get(*kind).weight).sum()
    }
}
