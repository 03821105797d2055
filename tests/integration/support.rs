//! Scripted collaborators shared by the integration tests

use async_trait::async_trait;
use pagegauge::discovery::{Discoverer, ExtractError, LinkExtractor};
use pagegauge::measure::{
    CapabilityError, MeasurementProfile, MeasurementRunner, MetricKind, PageLoadCapability,
    PageSession, PerformanceMetrics,
};
use pagegauge::report::Report;
use pagegauge::state::LogEntry;
use pagegauge::storage::{MemoryStore, StorageError, StorageResult, TaskStore};
use pagegauge::task::{Orchestrator, PipelineSettings, Task, TaskId};
use pagegauge::{ProgressEvent, TaskStatus};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use url::Url;

pub fn fast_metrics() -> PerformanceMetrics {
    PerformanceMetrics::default()
        .with(MetricKind::Lcp, 1200.0)
        .with(MetricKind::Fcp, 800.0)
        .with(MetricKind::Cls, 0.02)
        .with(MetricKind::Tti, 2000.0)
        .with(MetricKind::Tbt, 50.0)
}

pub fn slow_metrics() -> PerformanceMetrics {
    PerformanceMetrics::default()
        .with(MetricKind::Lcp, 6500.0)
        .with(MetricKind::Fcp, 3500.0)
        .with(MetricKind::Cls, 0.4)
        .with(MetricKind::Tti, 12000.0)
        .with(MetricKind::Tbt, 900.0)
}

/// Pauses a navigation until the test releases it
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Clone)]
pub enum Behavior {
    Metrics(PerformanceMetrics),
    Fail(&'static str),
    Hang,
    Gated(Arc<Gate>),
}

/// Page-load capability answering from a per-URL script
///
/// URLs without a script load with `fast_metrics()`.
#[derive(Clone, Default)]
pub struct ScriptedCapability {
    script: Arc<HashMap<String, Behavior>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    navigated: Arc<Mutex<Vec<String>>>,
}

impl ScriptedCapability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, url: &str, behavior: Behavior) -> Self {
        Arc::make_mut(&mut self.script).insert(url.to_string(), behavior);
        self
    }

    /// Highest number of sessions navigating at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn navigated(&self) -> Vec<String> {
        self.navigated.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageLoadCapability for ScriptedCapability {
    async fn open_session(&self) -> Result<Box<dyn PageSession>, CapabilityError> {
        Ok(Box::new(ScriptedSession {
            capability: self.clone(),
            loaded: None,
        }))
    }
}

struct ScriptedSession {
    capability: ScriptedCapability,
    loaded: Option<PerformanceMetrics>,
}

#[async_trait]
impl PageSession for ScriptedSession {
    async fn navigate(
        &mut self,
        url: &Url,
        _profile: &MeasurementProfile,
    ) -> Result<(), CapabilityError> {
        let cap = &self.capability;
        cap.navigated.lock().unwrap().push(url.to_string());
        let now = cap.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        cap.peak.fetch_max(now, Ordering::SeqCst);

        let behavior = cap.script.get(url.as_str()).cloned();
        let outcome = match behavior {
            None => Ok(fast_metrics()),
            Some(Behavior::Metrics(metrics)) => {
                // Let other workers overlap with this one
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(metrics)
            }
            Some(Behavior::Fail(reason)) => Err(CapabilityError::Navigation(reason.to_string())),
            Some(Behavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(fast_metrics())
            }
            Some(Behavior::Gated(gate)) => {
                gate.entered.notify_one();
                gate.release.notified().await;
                Ok(fast_metrics())
            }
        };

        cap.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.loaded = Some(outcome?);
        Ok(())
    }

    async fn collect_metric(&mut self, metric: MetricKind) -> Result<Option<f64>, CapabilityError> {
        let metrics = self.loaded.ok_or(CapabilityError::NotLoaded)?;
        Ok(metrics.get(metric))
    }
}

/// In-memory site: page URL to outgoing hrefs
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, Vec<String>>,
    broken: HashSet<String>,
    gated: HashMap<String, Arc<Gate>>,
}

impl FakeSite {
    pub fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.pages
            .insert(url.to_string(), links.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn broken(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }

    /// Holds the fetch of `url` until the gate is released
    pub fn gated(mut self, url: &str, gate: Arc<Gate>) -> Self {
        self.gated.insert(url.to_string(), gate);
        self
    }
}

#[async_trait]
impl LinkExtractor for FakeSite {
    async fn fetch_and_extract_links(&self, url: &Url) -> Result<Vec<String>, ExtractError> {
        if let Some(gate) = self.gated.get(url.as_str()) {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.broken.contains(url.as_str()) {
            return Err(ExtractError::Http { status: 503 });
        }
        Ok(self.pages.get(url.as_str()).cloned().unwrap_or_default())
    }
}

/// Store whose writes can be made to fail, stall or hang per table
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_tasks: bool,
    fail_reports: bool,
    fail_logs: bool,
    hang_reports: bool,
    report_gate: Option<Arc<Gate>>,
}

impl FailingStore {
    pub fn failing_reports() -> Self {
        Self {
            fail_reports: true,
            ..Self::default()
        }
    }

    pub fn failing_tasks() -> Self {
        Self {
            fail_tasks: true,
            ..Self::default()
        }
    }

    pub fn failing_logs() -> Self {
        Self {
            fail_logs: true,
            ..Self::default()
        }
    }

    /// Report writes never return
    pub fn hanging_reports() -> Self {
        Self {
            hang_reports: true,
            ..Self::default()
        }
    }

    /// Report writes wait for the gate before landing
    pub fn gated_reports(gate: Arc<Gate>) -> Self {
        Self {
            report_gate: Some(gate),
            ..Self::default()
        }
    }
}

fn refuse(what: &str) -> StorageError {
    StorageError::Database(format!("{} table is read-only", what))
}

#[async_trait]
impl TaskStore for FailingStore {
    async fn save_task(&self, task: &Task) -> StorageResult<()> {
        if self.fail_tasks {
            return Err(refuse("tasks"));
        }
        self.inner.save_task(task).await
    }

    async fn save_report(&self, task_id: &TaskId, report: &Report) -> StorageResult<()> {
        if self.fail_reports {
            return Err(refuse("reports"));
        }
        if self.hang_reports {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(gate) = &self.report_gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.inner.save_report(task_id, report).await
    }

    async fn append_log(&self, task_id: &TaskId, entry: &LogEntry) -> StorageResult<()> {
        if self.fail_logs {
            return Err(refuse("task_logs"));
        }
        self.inner.append_log(task_id, entry).await
    }

    async fn load_task(&self, task_id: &TaskId) -> StorageResult<Option<Task>> {
        self.inner.load_task(task_id).await
    }

    async fn load_report(&self, task_id: &TaskId) -> StorageResult<Option<Report>> {
        self.inner.load_report(task_id).await
    }

    async fn load_logs(&self, task_id: &TaskId) -> StorageResult<Vec<LogEntry>> {
        self.inner.load_logs(task_id).await
    }
}

pub struct Harness {
    pub capability: ScriptedCapability,
    pub site: FakeSite,
    pub store: Arc<dyn TaskStore>,
    pub measurement_timeout: Duration,
    pub settings: PipelineSettings,
}

impl Harness {
    pub fn new(capability: ScriptedCapability) -> Self {
        Self {
            capability,
            site: FakeSite::default(),
            store: Arc::new(MemoryStore::new()),
            measurement_timeout: Duration::from_secs(5),
            settings: PipelineSettings::default(),
        }
    }

    pub fn site(mut self, site: FakeSite) -> Self {
        self.site = site;
        self
    }

    pub fn store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = store;
        self
    }

    pub fn measurement_timeout(mut self, timeout: Duration) -> Self {
        self.measurement_timeout = timeout;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.settings.workers = workers;
        self
    }

    pub fn persist_timeout(mut self, timeout: Duration) -> Self {
        self.settings.persist_timeout = timeout;
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator::new(
            Discoverer::new(Arc::new(self.site)),
            MeasurementRunner::new(Arc::new(self.capability), self.measurement_timeout),
            self.store,
        )
        .with_settings(self.settings)
    }
}

/// Receives events for `task_id` up to and including its terminal event
pub async fn collect_events(
    events: &mut broadcast::Receiver<ProgressEvent>,
    task_id: &TaskId,
) -> Vec<ProgressEvent> {
    let mut collected = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(30), events.recv())
            .await
            .expect("no terminal event within 30s")
            .expect("channel closed early");
        if event.task_id() != task_id {
            continue;
        }
        let terminal = event.is_terminal();
        collected.push(event);
        if terminal {
            return collected;
        }
    }
}

/// Waits for a task to finish, failing the test if it takes too long
pub async fn finish(orchestrator: &Orchestrator, task_id: &TaskId) -> TaskStatus {
    tokio::time::timeout(Duration::from_secs(30), orchestrator.wait(task_id))
        .await
        .expect("task did not finish within 30s")
        .expect("task is unknown")
}
