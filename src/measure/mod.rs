//! Measurement module
//!
//! This module contains:
//! - The five-metric data model (`PerformanceMetrics`, `MetricKind`)
//! - The emulation profile (`MeasurementProfile`)
//! - The page-load capability port (`PageLoadCapability`, `PageSession`)
//! - The timeout-bounded `MeasurementRunner`
//! - `HttpProbe`, a browserless capability used by the CLI

mod capability;
mod metrics;
mod probe;
mod profile;
mod runner;

pub use capability::{CapabilityError, PageLoadCapability, PageSession};
pub use metrics::{MetricKind, PerformanceMetrics};
pub use probe::HttpProbe;
pub use profile::{Device, MeasurementProfile, NetworkProfile};
pub use runner::{MeasurementRunner, DEFAULT_MEASUREMENT_TIMEOUT};
