//! Markdown report rendering
//!
//! Narrative summary followed by tables for results, failures and
//! recommendations.

use crate::analysis::{recommendations, ScoringWeights};
use crate::measure::{MetricKind, PerformanceMetrics};
use crate::output::stats::ReportSummary;
use crate::output::traits::{OutputResult, ReportFormat, ReportRenderer};
use crate::report::Report;

/// Renders a report as a markdown document
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    weights: ScoringWeights,
}

impl MarkdownRenderer {
    /// Uses `weights` to phrase recommendations against the same targets
    /// the scores were computed with
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }
}

impl ReportRenderer for MarkdownRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Markdown
    }

    fn render(&self, report: &Report) -> OutputResult<String> {
        Ok(format_markdown_report(report, &self.weights))
    }
}

/// Formats a report as markdown
pub fn format_markdown_report(report: &Report, weights: &ScoringWeights) -> String {
    let summary = ReportSummary::from_report(report);
    let mut md = String::new();

    md.push_str("# Performance Report\n\n");

    if report.is_partial() {
        md.push_str(
            "> **Partial report**: the task was cancelled before every URL was measured.\n\n",
        );
    }

    // Task metadata
    md.push_str("## Task\n\n");
    md.push_str(&format!("- **Task ID**: {}\n", report.task_id));
    md.push_str(&format!("- **Mode**: {}\n", report.mode));
    if let Some(seed) = &report.seed_url {
        md.push_str(&format!("- **Seed URL**: {}\n", seed));
    }
    md.push_str(&format!(
        "- **Generated**: {}\n",
        report.generated_at.to_rfc3339()
    ));
    md.push_str(&format!("- **Profile**: {}\n\n", report.profile));

    // Overview
    md.push_str("## Overview\n\n");
    md.push_str(&format!("- **URLs**: {}\n", summary.total));
    md.push_str(&format!("- **Measured**: {}\n", summary.measured));
    md.push_str(&format!(
        "- **Failed**: {} ({} timed out)\n",
        summary.failed, summary.timed_out
    ));
    if summary.skipped > 0 {
        md.push_str(&format!("- **Skipped**: {}\n", summary.skipped));
    }
    if let (Some(mean), Some(grade)) = (summary.mean_score, summary.mean_grade()) {
        md.push_str(&format!("- **Mean Score**: {:.1} ({})\n", mean, grade));
    }
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    if summary.measured > 0 {
        md.push_str("## Grade Distribution\n\n");
        md.push_str("| Grade | Pages |\n");
        md.push_str("|-------|-------|\n");
        for (grade, count) in &summary.grade_counts {
            md.push_str(&format!("| {} | {} |\n", grade, count));
        }
        md.push('\n');
    }

    // Results table
    if !report.results.is_empty() {
        md.push_str("## Results\n\n");
        md.push_str("| # | URL | Score | Grade |");
        for kind in MetricKind::ALL {
            md.push_str(&format!(" {} |", kind.label()));
        }
        md.push_str("\n|---|-----|-------|-------|");
        for _ in MetricKind::ALL {
            md.push_str("-----|");
        }
        md.push('\n');

        for (i, result) in report.results.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {} |",
                i + 1,
                escape_cell(&result.url),
                result.overall_score,
                result.grade
            ));
            for cell in metric_cells(&result.metrics) {
                md.push_str(&format!(" {} |", cell));
            }
            md.push('\n');
        }
        md.push('\n');

        if summary.with_assumed_metrics > 0 {
            md.push_str(
                "_n/a_: metric could not be measured and was given full credit.\n\n",
            );
        }
    }

    // Recommendations, worst pages first
    let advised: Vec<_> = report
        .results
        .iter()
        .rev()
        .map(|r| (r, recommendations(r, weights)))
        .filter(|(_, lines)| !lines.is_empty())
        .collect();
    if !advised.is_empty() {
        md.push_str("## Recommendations\n\n");
        for (result, lines) in advised {
            md.push_str(&format!("### {} ({})\n\n", result.url, result.overall_score));
            for line in lines {
                md.push_str(&format!("- {}\n", line));
            }
            md.push('\n');
        }
    }

    // Failures
    if !report.failures.is_empty() {
        md.push_str("## Failures\n\n");
        md.push_str("| URL | Reason |\n");
        md.push_str("|-----|--------|\n");
        for failure in &report.failures {
            let reason = if failure.timed_out {
                format!("timeout: {}", failure.reason)
            } else {
                failure.reason.clone()
            };
            md.push_str(&format!(
                "| {} | {} |\n",
                escape_cell(&failure.url),
                escape_cell(&reason)
            ));
        }
        md.push('\n');
    }

    if !report.skipped.is_empty() {
        md.push_str("## Not Measured\n\n");
        for url in &report.skipped {
            md.push_str(&format!("- {}\n", url));
        }
        md.push('\n');
    }

    md
}

fn metric_cells(metrics: &PerformanceMetrics) -> Vec<String> {
    MetricKind::ALL
        .into_iter()
        .map(|kind| match metrics.get(kind) {
            Some(value) => kind.format_value(value),
            None => "_n/a_".to_string(),
        })
        .collect()
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}
