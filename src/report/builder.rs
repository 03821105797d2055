use crate::analysis::ScoredResult;
use crate::discovery::DiscoveredUrl;
use crate::report::{FailedUrl, Report};
use crate::task::Task;
use chrono::Utc;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Aggregates per-URL outcomes into a report
///
/// Pure aggregation without I/O. `results` are ordered by descending
/// `overall_score`; equal scores keep the order of `discovered`.
pub fn build_report(
    task: &Task,
    discovered: &[DiscoveredUrl],
    mut results: Vec<ScoredResult>,
    failures: Vec<FailedUrl>,
    skipped: Vec<String>,
) -> Report {
    let position: HashMap<&str, usize> = discovered
        .iter()
        .enumerate()
        .map(|(i, d)| (d.url.as_str(), i))
        .collect();

    results.sort_by_key(|r| {
        (
            Reverse(r.overall_score),
            position.get(r.url.as_str()).copied().unwrap_or(usize::MAX),
        )
    });

    Report {
        task_id: task.id.clone(),
        mode: task.mode,
        generated_at: Utc::now().max(task.created_at),
        seed_url: task.config.seed_url().map(str::to_string),
        profile: task.config.profile,
        discovered_urls: discovered.to_vec(),
        results,
        failures,
        skipped,
    }
}
