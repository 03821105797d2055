//! Persistence port for task records
//!
//! The orchestrator persists three things through [`TaskStore`]:
//! - task records on every lifecycle transition
//! - the final (or partial) report
//! - the log trail, one entry at a time
//!
//! Every write is idempotent: saving a task or report again overwrites it,
//! and appending a log entry with an already stored sequence number is a
//! no-op.

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::report::Report;
use crate::state::LogEntry;
use crate::task::{Task, TaskId};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage write did not finish within {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable key-value persistence for tasks, reports and log trails
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts or replaces a task record
    async fn save_task(&self, task: &Task) -> StorageResult<()>;

    /// Inserts or replaces the report of a task
    async fn save_report(&self, task_id: &TaskId, report: &Report) -> StorageResult<()>;

    /// Appends a log entry; entries already stored under the same sequence
    /// number are left untouched
    async fn append_log(&self, task_id: &TaskId, entry: &LogEntry) -> StorageResult<()>;

    async fn load_task(&self, task_id: &TaskId) -> StorageResult<Option<Task>>;

    async fn load_report(&self, task_id: &TaskId) -> StorageResult<Option<Report>>;

    /// Returns the log trail ordered by sequence number
    async fn load_logs(&self, task_id: &TaskId) -> StorageResult<Vec<LogEntry>>;
}
