//! Weighted 0-100 scoring and letter grades
//!
//! Scoring is a pure function of the metrics and the weights.

use crate::analysis::{MetricWeight, ScoringWeights};
use crate::measure::{MetricKind, PerformanceMetrics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Letter grade derived from an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Maps a 0-100 score to a grade
    ///
    /// | Score | Grade |
    /// |-------|-------|
    /// | >= 90 | A |
    /// | >= 80 | B |
    /// | >= 70 | C |
    /// | >= 60 | D |
    /// | < 60 | F |
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::A,
            80..=89 => Self::B,
            70..=79 => Self::C,
            60..=69 => Self::D,
            _ => Self::F,
        }
    }

    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        write!(f, "{}", letter)
    }
}

/// Outcome of scoring one set of metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScores {
    /// Per-metric contribution, already multiplied by the weight
    pub subscores: BTreeMap<MetricKind, f64>,

    /// Rounded sum of the subscores, 0-100
    pub overall: u8,

    pub grade: Grade,

    /// Metrics that were not measured and received full credit
    pub unavailable: Vec<MetricKind>,
}

/// Unweighted 0-100 score of one metric value
///
/// Values at or below the threshold score 100. Above it the score drops by
/// one point per 100 units for time metrics, or by ten points per unit for
/// inverse metrics, and never goes below 0.
pub fn raw_score(value: f64, params: &MetricWeight) -> f64 {
    let raw = if value <= params.threshold {
        100.0
    } else if params.inverse {
        100.0 - (value - params.threshold) * 10.0
    } else {
        100.0 - (value - params.threshold) / 100.0
    };
    raw.clamp(0.0, 100.0)
}

/// Scores a set of metrics
///
/// A metric that is not available counts as a perfect 100 for that metric
/// and is listed in `unavailable`.
pub fn score_metrics(metrics: &PerformanceMetrics, weights: &ScoringWeights) -> MetricScores {
    let mut subscores = BTreeMap::new();
    let mut unavailable = Vec::new();

    for kind in MetricKind::ALL {
        let params = weights.get(kind);
        let raw = match metrics.get(kind) {
            Some(value) => raw_score(value, &params),
            None => {
                unavailable.push(kind);
                100.0
            }
        };
        subscores.insert(kind, raw * params.weight);
    }

    let total: f64 = subscores.values().sum();
    let overall = total.round().clamp(0.0, 100.0) as u8;

    MetricScores {
        subscores,
        overall,
        grade: Grade::from_score(overall),
        unavailable,
    }
}
