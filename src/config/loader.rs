//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::TrackerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment override {name}='{value}'")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: TOML file (if any), then process environment, then validation.
pub fn load_config(path: Option<&Path>) -> Result<TrackerConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => TrackerConfig::default(),
    };

    let config = apply_env_overrides(config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Recognized: `PORT`, `HOST`, `TRACKER_UPSTREAM_BASE_URL`, `TRACKER_UPSTREAM_TRACKING_URL`.
pub fn apply_env_overrides<F>(mut config: TrackerConfig, lookup: F) -> Result<TrackerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (mut host, mut port) = split_bind_address(&config.listener.bind_address);

    if let Some(value) = lookup("PORT") {
        port = value
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::Env { name: "PORT", value: value.clone() })?
            .to_string();
    }
    if let Some(value) = lookup("HOST") {
        if value.trim().is_empty() {
            return Err(ConfigError::Env { name: "HOST", value });
        }
        host = value.trim().to_string();
    }
    config.listener.bind_address = format!("{}:{}", host, port);

    if let Some(value) = lookup("TRACKER_UPSTREAM_BASE_URL") {
        config.upstream.base_url = value;
    }
    if let Some(value) = lookup("TRACKER_UPSTREAM_TRACKING_URL") {
        config.upstream.tracking_url = value;
    }

    Ok(config)
}

fn split_bind_address(addr: &str) -> (String, String) {
    match addr.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.to_string()),
        None => (addr.to_string(), "8000".to_string()),
    }
}
