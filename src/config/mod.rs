//! Configuration module for Pagegauge
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use pagegauge::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pagegauge.toml")).unwrap();
//! println!("Discovery will use max depth: {}", config.discovery.max_depth);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, DiscoverySettings, MeasurementSettings, MetricOverride, OutputConfig,
    ScoringOverrides, UserAgentConfig,
};

pub use parser::{load_config, parse_config};
pub use validation::{validate, MAX_WORKERS};
