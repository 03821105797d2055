//! Progress channel
//!
//! The orchestrator pushes lifecycle and progress events for every task
//! into a [`ProgressSink`]. Events of one task are published in the order
//! they are produced; no ordering holds across tasks. Subscribers must
//! tolerate duplicate log lines and treat `percent` as non-decreasing.

use crate::report::Report;
use crate::state::LogEntry;
use crate::task::TaskId;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default number of buffered events per subscriber
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// One event in the life of a task
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Started {
        task_id: TaskId,
    },
    Progress {
        task_id: TaskId,
        percent: u8,
        log: LogEntry,
    },
    Completed {
        task_id: TaskId,
        report: Arc<Report>,
    },
    Failed {
        task_id: TaskId,
        error: String,
    },
    Cancelled {
        task_id: TaskId,
    },
}

impl ProgressEvent {
    pub fn task_id(&self) -> &TaskId {
        match self {
            Self::Started { task_id }
            | Self::Progress { task_id, .. }
            | Self::Completed { task_id, .. }
            | Self::Failed { task_id, .. }
            | Self::Cancelled { task_id } => task_id,
        }
    }

    /// Returns true for the last event a task ever produces
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed { .. } | Self::Cancelled { .. }
        )
    }
}

/// Receives events from task pipelines
///
/// Publishing never blocks and never fails the pipeline.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, event: ProgressEvent);
}

/// Fan-out sink over a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastChannel {
    sender: broadcast::Sender<ProgressEvent>,
}

impl BroadcastChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Registers a new subscriber; it sees events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl ProgressSink for BroadcastChannel {
    fn publish(&self, event: ProgressEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }
}
