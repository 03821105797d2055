//! Progress tracking for a running task
//!
//! A `ProgressState` is created together with its task, mutated only by the
//! task's pipeline, and kept after the task reaches a terminal state.

use crate::state::TaskStatus;
use crate::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a log trail entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        write!(f, "{}", label)
    }
}

/// One line in a task's log trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the trail, starting at 0; makes appends idempotent
    pub seq: u64,

    pub level: LogLevel,

    pub message: String,

    pub timestamp: DateTime<Utc>,
}

/// Snapshot of a task's progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub task_id: TaskId,

    /// Completion percentage, 0-100, never decreasing
    pub percent: u8,

    /// Append-only log trail
    pub logs: Vec<LogEntry>,

    /// Mirrors the task's status
    pub status: TaskStatus,
}

impl ProgressState {
    /// Creates an empty progress record for a new task
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            percent: 0,
            logs: Vec::new(),
            status: TaskStatus::Pending,
        }
    }

    /// Raises the percentage; lower values than the current one are ignored
    ///
    /// Returns the percentage after the update.
    pub fn advance_to(&mut self, percent: u8) -> u8 {
        self.percent = self.percent.max(percent.min(100));
        self.percent
    }

    /// Appends a log entry and returns a copy of it
    pub fn push_log(&mut self, level: LogLevel, message: impl Into<String>) -> LogEntry {
        let entry = LogEntry {
            seq: self.logs.len() as u64,
            level,
            message: message.into(),
            timestamp: Utc::now(),
        };
        self.logs.push(entry.clone());
        entry
    }

    /// Returns the most recent log entry, if any
    pub fn last_log(&self) -> Option<&LogEntry> {
        self.logs.last()
    }
}

/// Percentage of `processed` out of `total`, rounded down
///
/// An empty batch counts as fully processed.
pub fn percent_of(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((processed.min(total) * 100) / total) as u8
}
