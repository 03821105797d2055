//! State module for tracking task lifecycle and progress
//!
//! # Components
//!
//! - `TaskStatus`: lifecycle state machine of a task
//! - `ProgressState`: percentage, log trail and mirrored status of a task
//! - `LogEntry` / `LogLevel`: entries of the log trail

mod progress;
mod task_status;

pub use progress::{percent_of, LogEntry, LogLevel, ProgressState};
pub use task_status::TaskStatus;
