//! Submission validation
//!
//! A `SubmitRequest` is the flat shape a CLI or request handler fills in.
//! Validating it yields the immutable `TaskConfig`; a request that fails
//! validation never becomes a task.

use crate::discovery::compile_patterns;
use crate::measure::{Device, MeasurementProfile, NetworkProfile};
use crate::task::{Target, TaskConfig, TaskMode};
use crate::url::normalize_url;
use crate::{InputError, InputResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_MAX_DEPTH: u32 = 2;
pub const DEFAULT_MAX_PAGES: usize = 50;
pub const MAX_DEPTH_LIMIT: u32 = 10;
pub const MAX_PAGES_LIMIT: usize = 10_000;

/// Raw task submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitRequest {
    pub mode: TaskMode,
    pub urls: Vec<String>,
    pub seed_url: Option<String>,
    pub max_depth: Option<u32>,
    pub max_pages: Option<usize>,
    pub allowed_domains: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub device: Device,
    pub network: NetworkProfile,
    pub cpu_throttle: f64,
}

impl Default for SubmitRequest {
    fn default() -> Self {
        Self {
            mode: TaskMode::Manual,
            urls: Vec::new(),
            seed_url: None,
            max_depth: None,
            max_pages: None,
            allowed_domains: Vec::new(),
            exclude_patterns: Vec::new(),
            device: Device::default(),
            network: NetworkProfile::default(),
            cpu_throttle: 1.0,
        }
    }
}

impl SubmitRequest {
    /// Manual-mode request over an explicit URL list
    pub fn manual<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: TaskMode::Manual,
            urls: urls.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Crawl-mode request starting at `seed_url`
    pub fn crawl(seed_url: impl Into<String>) -> Self {
        Self {
            mode: TaskMode::Crawl,
            seed_url: Some(seed_url.into()),
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_profile(mut self, profile: MeasurementProfile) -> Self {
        self.device = profile.device;
        self.network = profile.network;
        self.cpu_throttle = profile.cpu_throttle;
        self
    }

    /// Validates the request and converts it into a task configuration
    pub fn validate(self) -> InputResult<TaskConfig> {
        let profile = validate_profile(self.device, self.network, self.cpu_throttle)?;

        let target = match self.mode {
            TaskMode::Manual => {
                if self.seed_url.is_some() {
                    return Err(InputError::Validation(
                        "seed_url is only valid in crawl mode".to_string(),
                    ));
                }
                Target::Manual {
                    urls: validate_url_list(&self.urls)?,
                }
            }
            TaskMode::Crawl => {
                let seed = self.seed_url.as_deref().ok_or_else(|| {
                    InputError::Validation("crawl mode requires a seed_url".to_string())
                })?;
                let seed_url = normalize_url(seed)
                    .map_err(|e| InputError::InvalidUrl(format!("{}: {}", seed, e)))?;

                let max_depth = self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
                validate_max_depth(max_depth)?;
                let max_pages = self.max_pages.unwrap_or(DEFAULT_MAX_PAGES);
                validate_max_pages(max_pages)?;

                validate_domains(&self.allowed_domains)?;
                compile_patterns(&self.exclude_patterns)?;

                Target::Crawl {
                    seed_url: seed_url.to_string(),
                    max_depth,
                    max_pages,
                    allowed_domains: self
                        .allowed_domains
                        .iter()
                        .map(|d| d.trim().to_ascii_lowercase())
                        .collect(),
                    exclude_patterns: self.exclude_patterns,
                }
            }
        };

        Ok(TaskConfig { target, profile })
    }
}

/// Normalizes a manual URL list, dropping later duplicates
fn validate_url_list(urls: &[String]) -> InputResult<Vec<String>> {
    if urls.is_empty() {
        return Err(InputError::Validation(
            "manual mode requires at least one URL".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(urls.len());
    for raw in urls {
        let url =
            normalize_url(raw).map_err(|e| InputError::InvalidUrl(format!("{}: {}", raw, e)))?;
        let key = url.to_string();
        if seen.insert(key.clone()) {
            normalized.push(key);
        } else {
            tracing::debug!("Dropping duplicate URL {}", raw);
        }
    }
    Ok(normalized)
}

pub(crate) fn validate_max_depth(max_depth: u32) -> InputResult<()> {
    if max_depth > MAX_DEPTH_LIMIT {
        return Err(InputError::Validation(format!(
            "max_depth must be at most {}, got {}",
            MAX_DEPTH_LIMIT, max_depth
        )));
    }
    Ok(())
}

pub(crate) fn validate_max_pages(max_pages: usize) -> InputResult<()> {
    if max_pages == 0 || max_pages > MAX_PAGES_LIMIT {
        return Err(InputError::Validation(format!(
            "max_pages must be between 1 and {}, got {}",
            MAX_PAGES_LIMIT, max_pages
        )));
    }
    Ok(())
}

pub(crate) fn validate_domains(domains: &[String]) -> InputResult<()> {
    for domain in domains {
        let trimmed = domain.trim();
        let base = trimmed.strip_prefix("*.").unwrap_or(trimmed);
        if base.is_empty() || base.contains('/') || base.contains('*') || base.contains(' ') {
            return Err(InputError::Validation(format!(
                "invalid allowed domain '{}'",
                domain
            )));
        }
    }
    Ok(())
}

pub(crate) fn validate_profile(
    device: Device,
    network: NetworkProfile,
    cpu_throttle: f64,
) -> InputResult<MeasurementProfile> {
    if !cpu_throttle.is_finite() || cpu_throttle < 1.0 {
        return Err(InputError::Validation(format!(
            "cpu_throttle must be a finite number >= 1.0, got {}",
            cpu_throttle
        )));
    }
    Ok(MeasurementProfile {
        device,
        network,
        cpu_throttle,
    })
}
