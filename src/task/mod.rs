//! Tasks and their orchestration
//!
//! A task moves through `pending -> running -> {completed, failed,
//! cancelled}`. The [`Orchestrator`] creates tasks, runs one pipeline per
//! task and answers progress and report queries.

mod id;
mod model;
mod orchestrator;
mod pipeline;
mod registry;
mod submit;

pub use id::TaskId;
pub use model::{Target, Task, TaskConfig, TaskMode};
pub use orchestrator::Orchestrator;
pub use pipeline::{PipelineSettings, DEFAULT_PERSIST_TIMEOUT};
pub use submit::{
    SubmitRequest, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES, MAX_DEPTH_LIMIT, MAX_PAGES_LIMIT,
};
pub(crate) use submit::{validate_domains, validate_max_depth, validate_max_pages, validate_profile};
