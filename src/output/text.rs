use crate::output::stats::ReportSummary;
use crate::output::traits::{OutputResult, ReportFormat, ReportRenderer};
use crate::report::Report;

/// Plain-text narrative summary, suitable for a terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl ReportRenderer for TextRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Text
    }

    fn render(&self, report: &Report) -> OutputResult<String> {
        let summary = ReportSummary::from_report(report);
        let mut out = String::new();

        out.push_str(&format!(
            "Performance report for task {} ({} mode)\n",
            report.task_id, report.mode
        ));
        if let Some(seed) = &report.seed_url {
            out.push_str(&format!("Seed: {}\n", seed));
        }
        out.push_str(&format!(
            "Generated {} with profile {}\n\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.profile
        ));

        out.push_str(&format!(
            "{} URLs: {} measured, {} failed, {} not measured.",
            summary.total, summary.measured, summary.failed, summary.skipped
        ));
        if let (Some(mean), Some(grade)) = (summary.mean_score, summary.mean_grade()) {
            out.push_str(&format!(" Mean score {:.0} ({}).", mean, grade));
        }
        out.push('\n');
        if report.is_partial() {
            out.push_str("The task was cancelled; this report is partial.\n");
        }

        if !report.results.is_empty() {
            out.push('\n');
            for result in &report.results {
                out.push_str(&format!(
                    "  {:>3} {}  {}",
                    result.overall_score, result.grade, result.url
                ));
                if result.has_assumed_metrics() {
                    let missing: Vec<&str> =
                        result.unavailable.iter().map(|k| k.label()).collect();
                    out.push_str(&format!("  [not measured: {}]", missing.join(", ")));
                }
                out.push('\n');
            }
        }

        if !report.failures.is_empty() {
            out.push_str("\nFailed:\n");
            for failure in &report.failures {
                let kind = if failure.timed_out { "timed out" } else { "error" };
                out.push_str(&format!("  {}  {}: {}\n", failure.url, kind, failure.reason));
            }
        }

        Ok(out)
    }
}
