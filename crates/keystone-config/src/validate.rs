//! Post-merge validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const LOG_FORMATS: [&str; 4] = ["pretty", "compact", "json", "full"];

/// Validate a merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_logging(config)?;
    validate_plugins(config)?;
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let logging = &config.logging;

    if logging.level.parse::<tracing::Level>().is_err() {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "'{}' is not a level; expected one of trace, debug, info, warn, error",
                logging.level
            ),
        });
    }

    if !LOG_FORMATS.contains(&logging.format.to_ascii_lowercase().as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unknown format '{}'; expected one of {}",
                logging.format,
                LOG_FORMATS.join(", ")
            ),
        });
    }

    if let Some(i) = logging.directives.iter().position(|d| d.trim().is_empty()) {
        return Err(ConfigError::ValidationError {
            field: format!("logging.directives[{i}]"),
            message: "directive must not be empty".to_owned(),
        });
    }

    Ok(())
}

fn validate_plugins(config: &Config) -> ConfigResult<()> {
    if let Some(i) = config
        .plugins
        .paths
        .iter()
        .position(|p| p.as_os_str().is_empty())
    {
        return Err(ConfigError::ValidationError {
            field: format!("plugins.paths[{i}]"),
            message: "path must not be empty".to_owned(),
        });
    }
    Ok(())
}
