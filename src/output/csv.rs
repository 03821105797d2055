//! Tabular CSV rendering: one row per URL
//!
//! Failed and skipped URLs get a row too, with empty score columns, so the
//! file always has exactly one row per discovered URL.

use crate::measure::{MetricKind, PerformanceMetrics};
use crate::output::traits::{OutputResult, ReportFormat, ReportRenderer};
use crate::report::Report;

const HEADER: &str = "url,status,score,grade,lcp_ms,fcp_ms,cls,tti_ms,tbt_ms,unavailable,reason";

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRenderer;

impl ReportRenderer for CsvRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Csv
    }

    fn render(&self, report: &Report) -> OutputResult<String> {
        let mut out = String::with_capacity(128 * (report.discovered_urls.len() + 1));
        out.push_str(HEADER);
        out.push('\n');

        for result in &report.results {
            let unavailable: Vec<&str> = result.unavailable.iter().map(|k| k.label()).collect();
            let mut row = vec![
                escape(&result.url),
                "measured".to_string(),
                result.overall_score.to_string(),
                result.grade.to_string(),
            ];
            row.extend(metric_columns(&result.metrics));
            row.push(escape(&unavailable.join(" ")));
            row.push(String::new());
            push_row(&mut out, &row);
        }

        for failure in &report.failures {
            let status = if failure.timed_out { "timeout" } else { "failed" };
            let mut row = vec![escape(&failure.url), status.to_string()];
            row.extend(std::iter::repeat(String::new()).take(2 + MetricKind::ALL.len() + 1));
            row.push(escape(&failure.reason));
            push_row(&mut out, &row);
        }

        for url in &report.skipped {
            let mut row = vec![escape(url), "skipped".to_string()];
            row.extend(std::iter::repeat(String::new()).take(2 + MetricKind::ALL.len() + 2));
            push_row(&mut out, &row);
        }

        Ok(out)
    }
}

fn metric_columns(metrics: &PerformanceMetrics) -> Vec<String> {
    MetricKind::ALL
        .into_iter()
        .map(|kind| match (kind, metrics.get(kind)) {
            (_, None) => String::new(),
            (MetricKind::Cls, Some(v)) => format!("{:.3}", v),
            (_, Some(v)) => format!("{:.0}", v),
        })
        .collect()
}

fn push_row(out: &mut String, row: &[String]) {
    out.push_str(&row.join(","));
    out.push('\n');
}

/// Quotes a field if it contains a separator, quote or line break
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::sample_report;

    #[test]
    fn test_one_row_per_url() {
        let report = sample_report();
        let csv = CsvRenderer.render(&report).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], HEADER);
        assert_eq!(lines.len(), 1 + report.discovered_urls.len());
        let columns = HEADER.split(',').count();
        assert!(lines[1..].iter().all(|l| l.split(',').count() >= columns));
    }

    #[test]
    fn test_rows_content() {
        let csv = CsvRenderer.render(&sample_report()).unwrap();
        assert!(csv.contains("https://fast.test/,measured,100,A,1200,800,0.020,2000,100,,"));
        assert!(csv.contains("https://slow.test/,measured,"));
        assert!(csv.contains(",TTI TBT,"));
        assert!(csv.contains("https://timeout.test/,timeout,"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
