//! Task registry
//!
//! Arena of task records addressed by `TaskId`. Each entry is written only
//! by the pipeline that owns it; readers take snapshots.

use crate::report::Report;
use crate::state::{LogEntry, LogLevel, ProgressState, TaskStatus};
use crate::task::{Task, TaskId};
use crate::OrchestratorError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Live state of one task
pub(crate) struct TaskEntry {
    task: RwLock<Task>,
    progress: RwLock<ProgressState>,
    report: RwLock<Option<Arc<Report>>>,
    cancel: CancellationToken,
    /// Set once the pipeline has passed its last cancellation point
    sealed: Mutex<bool>,
    status: watch::Sender<TaskStatus>,
}

impl TaskEntry {
    fn new(task: Task) -> Self {
        let progress = ProgressState::new(task.id.clone());
        let (status, _) = watch::channel(task.status);
        Self {
            task: RwLock::new(task),
            progress: RwLock::new(progress),
            report: RwLock::new(None),
            cancel: CancellationToken::new(),
            sealed: Mutex::new(false),
            status,
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        read(&self.task).id.clone()
    }

    pub(crate) fn task(&self) -> Task {
        read(&self.task).clone()
    }

    pub(crate) fn status(&self) -> TaskStatus {
        read(&self.task).status
    }

    pub(crate) fn progress(&self) -> ProgressState {
        read(&self.progress).clone()
    }

    pub(crate) fn report(&self) -> Option<Arc<Report>> {
        read(&self.report).clone()
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Requests cancellation of a task that can still be cancelled
    ///
    /// Fails with `InvalidState` once the task is terminal or sealed.
    /// Returns false if cancellation had already been requested.
    pub(crate) fn request_cancel(&self) -> Result<bool, OrchestratorError> {
        let sealed = lock(&self.sealed);
        let status = self.status();
        if status.is_terminal() || *sealed {
            return Err(OrchestratorError::InvalidState {
                task_id: self.id(),
                status,
            });
        }
        if self.cancel.is_cancelled() {
            return Ok(false);
        }
        self.cancel.cancel();
        Ok(true)
    }

    /// Passes the last cancellation point
    ///
    /// Returns false if cancellation was requested first; otherwise every
    /// later `request_cancel` is refused.
    pub(crate) fn seal(&self) -> bool {
        let mut sealed = lock(&self.sealed);
        if self.cancel.is_cancelled() {
            return false;
        }
        *sealed = true;
        true
    }

    pub(crate) fn watch_status(&self) -> watch::Receiver<TaskStatus> {
        self.status.subscribe()
    }

    /// Applies a lifecycle transition and mirrors it into the progress record
    pub(crate) fn transition(&self, next: TaskStatus) -> Result<Task, OrchestratorError> {
        let snapshot = {
            let mut task = write(&self.task);
            task.transition(next)?;
            task.clone()
        };
        write(&self.progress).status = next;
        self.status.send_replace(next);
        Ok(snapshot)
    }

    /// Replaces the task record with `task`, which must be a legal
    /// successor of the current one
    pub(crate) fn commit(&self, task: Task) -> Result<(), OrchestratorError> {
        let status = task.status;
        {
            let mut current = write(&self.task);
            if !current.status.can_transition_to(status) {
                return Err(OrchestratorError::InvalidState {
                    task_id: current.id.clone(),
                    status: current.status,
                });
            }
            *current = task;
        }
        write(&self.progress).status = status;
        self.status.send_replace(status);
        Ok(())
    }

    pub(crate) fn push_log(&self, level: LogLevel, message: impl Into<String>) -> (u8, LogEntry) {
        let mut progress = write(&self.progress);
        let entry = progress.push_log(level, message);
        (progress.percent, entry)
    }

    pub(crate) fn advance_to(&self, percent: u8) -> u8 {
        write(&self.progress).advance_to(percent)
    }

    pub(crate) fn set_report(&self, report: Arc<Report>) {
        *write(&self.report) = Some(report);
    }
}

/// Registry of every task known to one orchestrator
#[derive(Default)]
pub(crate) struct TaskRegistry {
    entries: RwLock<HashMap<TaskId, Arc<TaskEntry>>>,
}

impl TaskRegistry {
    pub(crate) fn insert(&self, task: Task) -> Arc<TaskEntry> {
        let id = task.id.clone();
        let entry = Arc::new(TaskEntry::new(task));
        write(&self.entries).insert(id, Arc::clone(&entry));
        entry
    }

    pub(crate) fn get(&self, id: &TaskId) -> Result<Arc<TaskEntry>, OrchestratorError> {
        read(&self.entries)
            .get(id)
            .cloned()
            .ok_or_else(|| OrchestratorError::NotFound(id.clone()))
    }

    /// Snapshots of every task, oldest first
    pub(crate) fn tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = read(&self.entries).values().map(|e| e.task()).collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        tasks
    }

    /// Removes a terminal task
    pub(crate) fn remove_terminal(&self, id: &TaskId) -> Result<(), OrchestratorError> {
        let mut entries = write(&self.entries);
        let entry = entries
            .get(id)
            .ok_or_else(|| OrchestratorError::NotFound(id.clone()))?;
        let status = entry.status();
        if !status.is_terminal() {
            return Err(OrchestratorError::InvalidState {
                task_id: id.clone(),
                status,
            });
        }
        entries.remove(id);
        Ok(())
    }
}
