use crate::config::types::Config;
use crate::config::validation::validate;
use crate::InputError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(InputError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use pagegauge::config::load_config;
///
/// let config = load_config(Path::new("pagegauge.toml")).unwrap();
/// println!("Max depth: {}", config.discovery.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, InputError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, InputError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}
