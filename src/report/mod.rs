//! Report aggregation
//!
//! Rendering a `Report` into files lives in [`crate::output`].

mod builder;
mod types;

pub use builder::build_report;
pub use types::{FailedUrl, Report};
