//! Task records
use crate::measure::MeasurementProfile;
use crate::state::TaskStatus;
use crate::task::TaskId;
use crate::OrchestratorError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the URL set of a task is obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskMode {
    /// Measure an explicit list of URLs
    #[default]
    Manual,
    /// Discover URLs by crawling from a seed
    Crawl,
}

impl fmt::Display for TaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Crawl => write!(f, "crawl"),
        }
    }
}

/// Where the pages of a task come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Target {
    Manual {
        /// Normalized, duplicate-free URL list
        urls: Vec<String>,
    },
    Crawl {
        seed_url: String,
        max_depth: u32,
        max_pages: usize,
        allowed_domains: Vec<String>,
        exclude_patterns: Vec<String>,
    },
}

/// Validated, immutable input of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub target: Target,
    pub profile: MeasurementProfile,
}

impl TaskConfig {
    pub fn mode(&self) -> TaskMode {
        match self.target {
            Target::Manual { .. } => TaskMode::Manual,
            Target::Crawl { .. } => TaskMode::Crawl,
        }
    }

    /// Seed URL, in crawl mode only
    pub fn seed_url(&self) -> Option<&str> {
        match &self.target {
            Target::Crawl { seed_url, .. } => Some(seed_url),
            Target::Manual { .. } => None,
        }
    }
}

/// One submitted unit of discover, measure, score and report work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub mode: TaskMode,
    pub config: TaskConfig,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a pending task with a fresh identifier
    pub fn new(config: TaskConfig) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::generate(),
            mode: config.mode(),
            config,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Moves the task to `next`, refreshing `updated_at`
    ///
    /// Illegal transitions, including any out of a terminal state, leave
    /// the task untouched.
    pub fn transition(&mut self, next: TaskStatus) -> Result<(), OrchestratorError> {
        if !self.status.can_transition_to(next) {
            return Err(OrchestratorError::InvalidState {
                task_id: self.id.clone(),
                status: self.status,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    /// Returns a copy of the task after `next`, leaving `self` unchanged
    pub fn transitioned(&self, next: TaskStatus) -> Result<Task, OrchestratorError> {
        let mut copy = self.clone();
        copy.transition(next)?;
        Ok(copy)
    }

    // Clock reads can repeat or step back; updated_at must not
    fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }
}
