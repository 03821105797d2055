use crate::config::types::{
    Config, DiscoverySettings, MeasurementSettings, OutputConfig, ScoringOverrides,
    UserAgentConfig,
};
use crate::discovery::compile_patterns;
use crate::measure::MetricKind;
use crate::task::{validate_domains, validate_max_depth, validate_max_pages, validate_profile};
use crate::InputError;
use url::Url;

/// Upper bound on concurrent measurements per task
pub const MAX_WORKERS: usize = 16;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), InputError> {
    validate_discovery(&config.discovery)?;
    validate_measurement(&config.measurement)?;
    validate_scoring(&config.scoring)?;
    validate_user_agent(&config.user_agent)?;
    validate_output(&config.output)?;
    Ok(())
}

fn validate_discovery(config: &DiscoverySettings) -> Result<(), InputError> {
    validate_max_depth(config.max_depth)?;
    validate_max_pages(config.max_pages)?;
    validate_domains(&config.allowed_domains)?;
    compile_patterns(&config.exclude_patterns)?;

    if config.fetch_timeout_ms == 0 {
        return Err(InputError::Validation(
            "fetch-timeout-ms must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_measurement(config: &MeasurementSettings) -> Result<(), InputError> {
    validate_profile(config.device, config.network, config.cpu_throttle)?;

    if config.timeout_ms == 0 {
        return Err(InputError::Validation(
            "timeout-ms must be greater than 0".to_string(),
        ));
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(InputError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }
    Ok(())
}

fn validate_scoring(config: &ScoringOverrides) -> Result<(), InputError> {
    for kind in MetricKind::ALL {
        let Some(o) = config.get(kind) else {
            continue;
        };
        if let Some(weight) = o.weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(InputError::Validation(format!(
                    "{} weight must be a non-negative number, got {}",
                    kind, weight
                )));
            }
        }
        if let Some(threshold) = o.threshold {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(InputError::Validation(format!(
                    "{} threshold must be a positive number, got {}",
                    kind, threshold
                )));
            }
        }
    }

    // Scores only land in 0-100 when weights sum to 1; other sums are allowed
    let total = config.to_weights().total_weight();
    if (total - 1.0).abs() > 1e-6 {
        tracing::warn!("Scoring weights sum to {:.3}, not 1.0", total);
    }
    Ok(())
}

fn validate_user_agent(config: &UserAgentConfig) -> Result<(), InputError> {
    if config.name.is_empty() {
        return Err(InputError::Validation("user-agent name cannot be empty".to_string()));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(InputError::Validation(format!(
            "user-agent name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.name
        )));
    }

    if config.version.trim().is_empty() {
        return Err(InputError::Validation(
            "user-agent version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| InputError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }
    Ok(())
}

fn validate_output(config: &OutputConfig) -> Result<(), InputError> {
    if config.database_path.as_os_str().is_empty() {
        return Err(InputError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.report_dir.as_os_str().is_empty() {
        return Err(InputError::Validation("report-dir cannot be empty".to_string()));
    }

    if config.formats.is_empty() {
        return Err(InputError::Validation(
            "at least one output format is required".to_string(),
        ));
    }

    if config.persist_timeout_ms == 0 {
        return Err(InputError::Validation(
            "persist-timeout-ms must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
