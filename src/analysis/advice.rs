//! Human-readable recommendations for a scored page
use crate::analysis::{ScoredResult, ScoringWeights};
use crate::measure::MetricKind;

/// Fixed advice for a metric that missed its threshold
fn advice_for(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::Lcp => "optimize the largest above-the-fold image or text block (compress, preload, serve from a CDN)",
        MetricKind::Fcp => "reduce render-blocking CSS and scripts and improve server response time",
        MetricKind::Cls => "reserve space for images, ads and embeds so content does not shift while loading",
        MetricKind::Tti => "split and defer JavaScript so the main thread becomes idle sooner",
        MetricKind::Tbt => "break up long main-thread tasks and remove unused JavaScript",
    }
}

/// Recommendations for one page
///
/// One line per metric above its threshold, worst first (lowest score
/// ratio), followed by one note per metric that was not available.
pub fn recommendations(result: &ScoredResult, weights: &ScoringWeights) -> Vec<String> {
    let mut missed: Vec<(MetricKind, f64, f64)> = MetricKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let value = result.metrics.get(kind)?;
            let params = weights.get(kind);
            (value > params.threshold).then_some((kind, value, params.threshold))
        })
        .collect();

    missed.sort_by(|a, b| {
        let ra = a.1 / a.2.max(f64::EPSILON);
        let rb = b.1 / b.2.max(f64::EPSILON);
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut lines: Vec<String> = missed
        .into_iter()
        .map(|(kind, value, threshold)| {
            format!(
                "{} is {} (target {}): {}",
                kind,
                kind.format_value(value),
                kind.format_value(threshold),
                advice_for(kind)
            )
        })
        .collect();

    for kind in &result.unavailable {
        lines.push(format!(
            "{} could not be measured; full credit was assumed",
            kind.name()
        ));
    }

    lines
}
