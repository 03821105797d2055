use crate::output::traits::{OutputResult, ReportFormat, ReportRenderer};
use crate::report::Report;

/// Renders the report as a pretty-printed JSON document
///
/// The document is the serde representation of [`Report`] and can be
/// parsed back into one.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ReportRenderer for JsonRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }

    fn render(&self, report: &Report) -> OutputResult<String> {
        let mut json = serde_json::to_string_pretty(report)?;
        json.push('\n');
        Ok(json)
    }
}
