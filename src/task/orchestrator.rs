//! Task orchestrator
//!
//! Owns the task registry and starts one pipeline per submitted task.
//! Commands and queries never block on a running pipeline.

use crate::analysis::Analyzer;
use crate::channel::{BroadcastChannel, ProgressEvent, ProgressSink};
use crate::discovery::Discoverer;
use crate::measure::MeasurementRunner;
use crate::report::Report;
use crate::state::{ProgressState, TaskStatus};
use crate::storage::TaskStore;
use crate::task::pipeline::{span_for, Pipeline, PipelineSettings};
use crate::task::registry::TaskRegistry;
use crate::task::{SubmitRequest, Task, TaskConfig, TaskId};
use crate::OrchestratorError;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::Instrument;

/// Entry point for submitting and observing tasks
pub struct Orchestrator {
    registry: TaskRegistry,
    discoverer: Discoverer,
    runner: MeasurementRunner,
    analyzer: Arc<Analyzer>,
    store: Arc<dyn TaskStore>,
    channel: BroadcastChannel,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(
        discoverer: Discoverer,
        runner: MeasurementRunner,
        store: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            registry: TaskRegistry::default(),
            discoverer,
            runner,
            analyzer: Arc::new(Analyzer::default()),
            store,
            channel: BroadcastChannel::default(),
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = Arc::new(analyzer);
        self
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validates a submission and starts its pipeline
    ///
    /// Returns as soon as the task is running. Must be called from within
    /// a tokio runtime.
    pub fn submit(&self, request: SubmitRequest) -> Result<TaskId, OrchestratorError> {
        let config = request.validate()?;
        Ok(self.submit_config(config))
    }

    /// Starts a pipeline for an already validated configuration
    pub fn submit_config(&self, config: TaskConfig) -> TaskId {
        let entry = self.registry.insert(Task::new(config));
        let task_id = entry.id();

        if let Err(e) = entry.transition(TaskStatus::Running) {
            tracing::error!("New task {} could not start: {}", task_id, e);
            return task_id;
        }
        tracing::info!("Submitted task {}", task_id);

        let pipeline = Pipeline {
            entry,
            discoverer: self.discoverer.clone(),
            runner: self.runner.clone(),
            analyzer: Arc::clone(&self.analyzer),
            store: Arc::clone(&self.store),
            sink: Arc::new(self.channel.clone()) as Arc<dyn ProgressSink>,
            settings: self.settings.clone(),
        };
        tokio::spawn(pipeline.run().instrument(span_for(&task_id)));

        task_id
    }

    /// Requests cooperative cancellation
    ///
    /// The task turns `cancelled` once its pipeline reaches the next safe
    /// point; an in-flight measurement is allowed to finish or time out.
    /// Once the last URL has been processed and the pipeline is persisting
    /// its report, the task can no longer be cancelled and `InvalidState`
    /// is returned.
    pub fn cancel(&self, task_id: &TaskId) -> Result<(), OrchestratorError> {
        let entry = self.registry.get(task_id)?;
        if entry.request_cancel()? {
            tracing::info!("Cancellation requested for task {}", task_id);
        }
        Ok(())
    }

    pub fn get_progress(&self, task_id: &TaskId) -> Result<ProgressState, OrchestratorError> {
        Ok(self.registry.get(task_id)?.progress())
    }

    /// Returns the report of a completed task
    pub fn get_report(&self, task_id: &TaskId) -> Result<Arc<Report>, OrchestratorError> {
        self.report_in(task_id, TaskStatus::Completed)
    }

    /// Returns the partial report of a cancelled task
    pub fn get_partial_report(&self, task_id: &TaskId) -> Result<Arc<Report>, OrchestratorError> {
        self.report_in(task_id, TaskStatus::Cancelled)
    }

    fn report_in(
        &self,
        task_id: &TaskId,
        required: TaskStatus,
    ) -> Result<Arc<Report>, OrchestratorError> {
        let entry = self.registry.get(task_id)?;
        let status = entry.status();
        match entry.report() {
            Some(report) if status == required => Ok(report),
            _ => Err(OrchestratorError::NotReady {
                task_id: task_id.clone(),
                status,
            }),
        }
    }

    pub fn get_task(&self, task_id: &TaskId) -> Result<Task, OrchestratorError> {
        Ok(self.registry.get(task_id)?.task())
    }

    /// Snapshots of all known tasks, oldest first
    pub fn list_tasks(&self) -> Vec<Task> {
        self.registry.tasks()
    }

    /// Resolves once the task reaches a terminal state
    pub async fn wait(&self, task_id: &TaskId) -> Result<TaskStatus, OrchestratorError> {
        let entry = self.registry.get(task_id)?;
        let mut status = entry.watch_status();
        loop {
            let current = *status.borrow_and_update();
            if current.is_terminal() {
                return Ok(current);
            }
            if status.changed().await.is_err() {
                return Ok(entry.status());
            }
        }
    }

    /// Forgets a terminal task; its persisted records are kept
    pub fn purge(&self, task_id: &TaskId) -> Result<(), OrchestratorError> {
        self.registry.remove_terminal(task_id)?;
        tracing::debug!("Purged task {}", task_id);
        Ok(())
    }

    /// Subscribes to events of every task started from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.channel.subscribe()
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }
}
