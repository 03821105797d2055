//! Performance analysis
//!
//! Turns raw `PerformanceMetrics` into a weighted 0-100 score, a letter
//! grade and per-metric recommendations.

mod advice;
mod scorer;
mod weights;

pub use advice::recommendations;
pub use scorer::{raw_score, score_metrics, Grade, MetricScores};
pub use weights::{MetricWeight, ScoringWeights};

use crate::measure::{MetricKind, PerformanceMetrics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scored measurement of one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub url: String,

    pub metrics: PerformanceMetrics,

    /// Per-metric contribution, already multiplied by the weight
    pub subscores: BTreeMap<MetricKind, f64>,

    /// 0-100
    pub overall_score: u8,

    pub grade: Grade,

    /// Metrics scored optimistically because they were not measured
    pub unavailable: Vec<MetricKind>,
}

impl ScoredResult {
    /// Returns true if any metric was scored without a measurement
    pub fn has_assumed_metrics(&self) -> bool {
        !self.unavailable.is_empty()
    }
}

/// Scores measurements with a fixed set of weights
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    weights: ScoringWeights,
}

impl Analyzer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Scores the metrics measured for `url`
    pub fn score(&self, url: impl Into<String>, metrics: PerformanceMetrics) -> ScoredResult {
        let scores = score_metrics(&metrics, &self.weights);

        ScoredResult {
            url: url.into(),
            metrics,
            subscores: scores.subscores,
            overall_score: scores.overall,
            grade: scores.grade,
            unavailable: scores.unavailable,
        }
    }
}
