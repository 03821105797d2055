//! Per-task pipeline: discover, measure each URL, score, report
//!
//! One pipeline runs per task and is the only writer of that task's
//! registry entry. Per-URL failures are recorded and never abort the
//! batch; failures to discover the seed or to persist the outcome fail
//! the whole task.

use crate::analysis::{Analyzer, ScoredResult};
use crate::channel::{ProgressEvent, ProgressSink};
use crate::discovery::{DiscoveredUrl, DiscoveryConfig, Discoverer};
use crate::measure::{MeasurementProfile, MeasurementRunner, PerformanceMetrics};
use crate::report::{build_report, FailedUrl, Report};
use crate::state::{percent_of, LogLevel, TaskStatus};
use crate::storage::{StorageError, StorageResult, TaskStore};
use crate::task::registry::TaskEntry;
use crate::task::{Target, Task, TaskId};
use crate::{DiscoveryError, InputError, MeasurementError};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

pub const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables shared by every pipeline of one orchestrator
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Concurrent measurements per task; 1 measures strictly in order
    pub workers: usize,
    /// Upper bound for a single store write
    pub persist_timeout: Duration,
    /// Upper bound for fetching one page during discovery
    pub fetch_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: 1,
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
            fetch_timeout: crate::discovery::DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Errors that terminate a task with `failed`
#[derive(Debug, Error)]
enum PipelineError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("invalid task configuration: {0}")]
    Input(#[from] InputError),

    #[error("persistence failed: {0}")]
    Storage(#[from] StorageError),
}

enum Outcome {
    Completed(Report),
    Cancelled(Report),
}

pub(crate) struct Pipeline {
    pub(crate) entry: Arc<TaskEntry>,
    pub(crate) discoverer: Discoverer,
    pub(crate) runner: MeasurementRunner,
    pub(crate) analyzer: Arc<Analyzer>,
    pub(crate) store: Arc<dyn TaskStore>,
    pub(crate) sink: Arc<dyn ProgressSink>,
    pub(crate) settings: PipelineSettings,
}

impl Pipeline {
    pub(crate) async fn run(self) {
        let task_id = self.entry.id();
        self.sink.publish(ProgressEvent::Started {
            task_id: task_id.clone(),
        });
        self.log(LogLevel::Info, "task started").await;

        let outcome = match self.persist(self.store.save_task(&self.entry.task())).await {
            Ok(()) => self.execute().await,
            Err(e) => Err(PipelineError::Storage(e)),
        };

        match outcome {
            Ok(Outcome::Completed(report)) => self.complete(report).await,
            Ok(Outcome::Cancelled(report)) => self.finish_cancelled(report).await,
            Err(e) => self.fail(e.to_string()).await,
        }
    }

    async fn execute(&self) -> Result<Outcome, PipelineError> {
        let task = self.entry.task();
        let token = self.entry.cancel_token().clone();

        let discovered = self.discover(&task, &token).await?;
        if token.is_cancelled() {
            let skipped = discovered.iter().map(|d| d.url.clone()).collect();
            return Ok(Outcome::Cancelled(build_report(
                &task,
                &discovered,
                Vec::new(),
                Vec::new(),
                skipped,
            )));
        }

        self.log(
            LogLevel::Info,
            format!("measuring {} URLs", discovered.len()),
        )
        .await;
        let (results, failures, skipped) = self.measure_all(&task, &discovered, &token).await;

        let report = build_report(&task, &discovered, results, failures, skipped);
        if self.entry.seal() {
            Ok(Outcome::Completed(report))
        } else {
            Ok(Outcome::Cancelled(report))
        }
    }

    async fn discover(
        &self,
        task: &Task,
        token: &CancellationToken,
    ) -> Result<Vec<DiscoveredUrl>, PipelineError> {
        match &task.config.target {
            Target::Manual { urls } => Ok(urls
                .iter()
                .map(|url| DiscoveredUrl {
                    url: url.clone(),
                    depth: 0,
                })
                .collect()),
            Target::Crawl {
                seed_url,
                max_depth,
                max_pages,
                allowed_domains,
                exclude_patterns,
            } => {
                let seed = Url::parse(seed_url).map_err(|e| DiscoveryError::SeedUnreachable {
                    url: seed_url.clone(),
                    reason: e.to_string(),
                })?;
                let config = DiscoveryConfig::new(*max_depth, *max_pages)
                    .with_allowed_domains(allowed_domains.clone())
                    .with_fetch_timeout(self.settings.fetch_timeout)
                    .with_exclude_patterns(exclude_patterns)?;

                self.log(LogLevel::Info, format!("discovering pages from {}", seed))
                    .await;
                let result = self.discoverer.discover(&seed, &config, token).await?;

                if result.failed_fetches > 0 {
                    self.log(
                        LogLevel::Warn,
                        format!("{} pages could not be read for links", result.failed_fetches),
                    )
                    .await;
                }
                self.log(LogLevel::Info, format!("discovered {} URLs", result.len()))
                    .await;
                Ok(result.urls)
            }
        }
    }

    /// Measures every URL, at most `workers` at a time
    ///
    /// The loop body is the single writer of the result lists; measurements
    /// only hand their outcome back through the stream, in discovery order.
    async fn measure_all(
        &self,
        task: &Task,
        discovered: &[DiscoveredUrl],
        token: &CancellationToken,
    ) -> (Vec<ScoredResult>, Vec<FailedUrl>, Vec<String>) {
        let total = discovered.len();
        let profile = task.config.profile;
        let runner = self.runner.clone();
        let token = token.clone();

        // Each measurement owns its URL and runner so the pipeline future stays `Send`
        let mut outcomes = stream::iter(discovered.to_vec())
            .map(move |d: DiscoveredUrl| {
                let token = token.clone();
                let runner = runner.clone();
                async move {
                    // A measurement is never started once cancellation is requested
                    if token.is_cancelled() {
                        return (d, None);
                    }
                    let outcome = measure_one(&runner, &d.url, &profile).await;
                    (d, Some(outcome))
                }
            })
            .buffered(self.settings.workers.max(1));

        let mut results = Vec::new();
        let mut failures = Vec::new();
        let mut skipped = Vec::new();
        let mut processed = 0;

        while let Some((d, outcome)) = outcomes.next().await {
            let (level, line) = match outcome {
                None => {
                    skipped.push(d.url.clone());
                    continue;
                }
                Some(Ok(metrics)) => {
                    let scored = self.analyzer.score(d.url.clone(), metrics);
                    let message = format!(
                        "{} scored {} ({})",
                        d.url, scored.overall_score, scored.grade
                    );
                    results.push(scored);
                    (LogLevel::Info, message)
                }
                Some(Err(e)) => {
                    let message = format!("{} failed: {}", d.url, e);
                    failures.push(FailedUrl {
                        url: d.url.clone(),
                        reason: e.to_string(),
                        timed_out: e.is_timeout(),
                    });
                    (LogLevel::Warn, message)
                }
            };

            processed += 1;
            self.entry.advance_to(percent_of(processed, total));
            self.log(level, format!("[{}/{}] {}", processed, total, line))
                .await;
        }

        if !skipped.is_empty() {
            tracing::info!("Cancelled with {} URLs not started", skipped.len());
        }
        (results, failures, skipped)
    }

    async fn complete(&self, report: Report) {
        let task_id = self.entry.id();
        let report = Arc::new(report);

        if let Err(e) = self.persist(self.store.save_report(&task_id, &report)).await {
            return self.fail(format!("could not persist report: {}", e)).await;
        }

        let completed = match self.entry.task().transitioned(TaskStatus::Completed) {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!("Task finished in an unexpected state: {}", e);
                return;
            }
        };
        if let Err(e) = self.persist(self.store.save_task(&completed)).await {
            return self.fail(format!("could not persist task: {}", e)).await;
        }

        self.entry.set_report(Arc::clone(&report));
        self.entry.advance_to(100);
        self.log(
            LogLevel::Info,
            format!(
                "task completed: {} measured, {} failed",
                report.results.len(),
                report.failures.len()
            ),
        )
        .await;

        if let Err(e) = self.entry.commit(completed) {
            tracing::warn!("Could not mark task completed: {}", e);
            return;
        }
        self.sink.publish(ProgressEvent::Completed { task_id, report });
    }

    async fn finish_cancelled(&self, report: Report) {
        let task_id = self.entry.id();
        let report = Arc::new(report);

        // The partial report is best effort; cancellation itself cannot fail
        if let Err(e) = self.persist(self.store.save_report(&task_id, &report)).await {
            tracing::warn!("Partial report not persisted: {}", e);
        }
        self.entry.set_report(Arc::clone(&report));
        self.log(
            LogLevel::Info,
            format!(
                "task cancelled: {} of {} URLs processed",
                report.processed(),
                report.discovered_urls.len()
            ),
        )
        .await;

        self.finalize(TaskStatus::Cancelled).await;
        self.sink.publish(ProgressEvent::Cancelled { task_id });
    }

    async fn fail(&self, error: String) {
        let task_id = self.entry.id();
        tracing::error!("Task failed: {}", error);
        self.log(LogLevel::Error, format!("task failed: {}", error))
            .await;

        self.finalize(TaskStatus::Failed).await;
        self.sink.publish(ProgressEvent::Failed { task_id, error });
    }

    async fn finalize(&self, status: TaskStatus) {
        match self.entry.transition(status) {
            Ok(task) => {
                if let Err(e) = self.persist(self.store.save_task(&task)).await {
                    tracing::warn!("Final {} state not persisted: {}", status, e);
                }
            }
            Err(e) => tracing::warn!("Could not mark task {}: {}", status, e),
        }
    }

    /// Appends to the log trail, publishes it and mirrors it into tracing
    async fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }

        let task_id = self.entry.id();
        let (percent, entry) = self.entry.push_log(level, message);
        self.sink.publish(ProgressEvent::Progress {
            task_id: task_id.clone(),
            percent,
            log: entry.clone(),
        });

        if let Err(e) = self.persist(self.store.append_log(&task_id, &entry)).await {
            tracing::warn!("Log entry {} not persisted: {}", entry.seq, e);
        }
    }

    /// Bounds one store write by the persist timeout
    ///
    /// Hitting the timeout only stops waiting. A store that runs its writes
    /// on a blocking thread (as `SqliteStore` does) keeps that write going,
    /// so the record may still land after the task has been marked failed.
    async fn persist<T, F>(&self, write: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        let limit = self.settings.persist_timeout;
        tokio::time::timeout(limit, write)
            .await
            .map_err(|_| StorageError::Timeout(limit))?
    }
}

async fn measure_one(
    runner: &MeasurementRunner,
    url: &str,
    profile: &MeasurementProfile,
) -> Result<PerformanceMetrics, MeasurementError> {
    let parsed = Url::parse(url).map_err(|e| MeasurementError::Navigation {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    runner.measure(&parsed, profile).await
}

/// Tracing span every event of one pipeline is recorded under
pub(crate) fn span_for(task_id: &TaskId) -> tracing::Span {
    tracing::info_span!("task", task_id = %task_id)
}
