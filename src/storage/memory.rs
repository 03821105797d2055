use crate::report::Report;
use crate::state::LogEntry;
use crate::storage::{StorageResult, TaskStore};
use crate::task::{Task, TaskId};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Tables {
    tasks: HashMap<TaskId, Task>,
    reports: HashMap<TaskId, Report>,
    logs: HashMap<TaskId, BTreeMap<u64, LogEntry>>,
}

/// In-process store, for tests and runs that do not need durability
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored task records
    pub fn task_count(&self) -> usize {
        self.lock().tasks.len()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn save_task(&self, task: &Task) -> StorageResult<()> {
        self.lock().tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn save_report(&self, task_id: &TaskId, report: &Report) -> StorageResult<()> {
        self.lock().reports.insert(task_id.clone(), report.clone());
        Ok(())
    }

    async fn append_log(&self, task_id: &TaskId, entry: &LogEntry) -> StorageResult<()> {
        self.lock()
            .logs
            .entry(task_id.clone())
            .or_default()
            .entry(entry.seq)
            .or_insert_with(|| entry.clone());
        Ok(())
    }

    async fn load_task(&self, task_id: &TaskId) -> StorageResult<Option<Task>> {
        Ok(self.lock().tasks.get(task_id).cloned())
    }

    async fn load_report(&self, task_id: &TaskId) -> StorageResult<Option<Report>> {
        Ok(self.lock().reports.get(task_id).cloned())
    }

    async fn load_logs(&self, task_id: &TaskId) -> StorageResult<Vec<LogEntry>> {
        Ok(self
            .lock()
            .logs
            .get(task_id)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default())
    }
}
