//! Summary statistics over a report

use crate::analysis::Grade;
use crate::report::Report;

/// Aggregate numbers shown at the top of every rendered report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    /// Discovered or listed URLs
    pub total: usize,

    pub measured: usize,

    pub failed: usize,

    /// Failures caused by a timeout
    pub timed_out: usize,

    /// URLs never started because the task was cancelled
    pub skipped: usize,

    /// Mean overall score of measured URLs
    pub mean_score: Option<f64>,

    /// Count per grade, in `Grade::ALL` order
    pub grade_counts: Vec<(Grade, usize)>,

    /// Results that had at least one metric scored without a measurement
    pub with_assumed_metrics: usize,
}

impl ReportSummary {
    pub fn from_report(report: &Report) -> Self {
        let measured = report.results.len();
        let mean_score = (measured > 0).then(|| {
            report
                .results
                .iter()
                .map(|r| f64::from(r.overall_score))
                .sum::<f64>()
                / measured as f64
        });

        let grade_counts = Grade::ALL
            .into_iter()
            .map(|grade| {
                let count = report.results.iter().filter(|r| r.grade == grade).count();
                (grade, count)
            })
            .collect();

        Self {
            total: report.discovered_urls.len(),
            measured,
            failed: report.failures.len(),
            timed_out: report.failures.iter().filter(|f| f.timed_out).count(),
            skipped: report.skipped.len(),
            mean_score,
            grade_counts,
            with_assumed_metrics: report
                .results
                .iter()
                .filter(|r| r.has_assumed_metrics())
                .count(),
        }
    }

    /// Share of processed URLs that were measured, as a percentage
    pub fn success_rate(&self) -> f64 {
        let processed = self.measured + self.failed;
        if processed == 0 {
            return 0.0;
        }
        (self.measured as f64 / processed as f64) * 100.0
    }

    /// Grade of the mean score
    pub fn mean_grade(&self) -> Option<Grade> {
        self.mean_score
            .map(|mean| Grade::from_score(mean.round().clamp(0.0, 100.0) as u8))
    }
}
