//! Output module for rendering and exporting reports
//!
//! This module handles:
//! - Rendering a `Report` as JSON, markdown, CSV or plain text
//! - Summary statistics shared by the renderers
//! - Writing rendered reports to a directory

mod csv;
mod json;
mod markdown;
pub mod stats;
mod text;
mod traits;

pub use self::csv::CsvRenderer;
pub use json::JsonRenderer;
pub use markdown::{format_markdown_report, MarkdownRenderer};
pub use stats::ReportSummary;
pub use text::TextRenderer;
pub use traits::{OutputError, OutputResult, ReportFormat, ReportRenderer};

use crate::analysis::ScoringWeights;
use crate::report::Report;
use crate::task::TaskId;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Returns the renderer for `format`
pub fn renderer_for(format: ReportFormat, weights: &ScoringWeights) -> Box<dyn ReportRenderer> {
    match format {
        ReportFormat::Json => Box::new(JsonRenderer),
        ReportFormat::Markdown => Box::new(MarkdownRenderer::new(*weights)),
        ReportFormat::Csv => Box::new(CsvRenderer),
        ReportFormat::Text => Box::new(TextRenderer),
    }
}

/// File name of a report: `report_<task id>.<ext>`
pub fn report_file_name(task_id: &TaskId, format: ReportFormat) -> String {
    format!("report_{}.{}", task_id, format.extension())
}

/// Renders `report` in every requested format into `dir`
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Paths written, in the order of `formats`
/// * `Err(OutputError)` - Rendering or writing failed
pub fn write_reports(
    report: &Report,
    dir: &Path,
    formats: &[ReportFormat],
    weights: &ScoringWeights,
) -> OutputResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let rendered = renderer_for(format, weights).render(report)?;
        let path = dir.join(report_file_name(&report.task_id, format));

        let mut file = File::create(&path)?;
        file.write_all(rendered.as_bytes())?;

        tracing::debug!("Wrote {} report to {}", format, path.display());
        written.push(path);
    }
    Ok(written)
}
