//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate upstream URLs and value ranges (timeouts > 0, bulk limits)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TrackerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::TrackerConfig;

/// Upper bound for `api.max_bulk`.
const MAX_BULK_CEILING: usize = 100;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration for values serde cannot reject on its own.
pub fn validate_config(config: &TrackerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let upstream = &config.upstream;
    for (field, value) in [
        ("upstream.base_url", &upstream.base_url),
        ("upstream.tracking_url", &upstream.tracking_url),
        ("upstream.origin", &upstream.origin),
    ] {
        if let Err(e) = Url::parse(value) {
            errors.push(ValidationError::new(field, format!("'{}': {}", value, e)));
        }
    }
    if upstream.timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.timeout_secs", "must be > 0"));
    }
    if upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_secs", "must be > 0"));
    }
    if upstream.lookup_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.lookup_timeout_secs", "must be > 0"));
    }
    if upstream.user_agent.trim().is_empty() {
        errors.push(ValidationError::new("upstream.user_agent", "must not be empty"));
    }

    let api = &config.api;
    if api.max_bulk == 0 || api.max_bulk > MAX_BULK_CEILING {
        errors.push(ValidationError::new(
            "api.max_bulk",
            format!("must be within 1..={}", MAX_BULK_CEILING),
        ));
    }
    if api.bulk_concurrency == 0 {
        errors.push(ValidationError::new("api.bulk_concurrency", "must be > 0"));
    }
    if api.request_timeout_secs == 0 {
        errors.push(ValidationError::new("api.request_timeout_secs", "must be > 0"));
    } else if let Some(needed) = bulk_budget_secs(config) {
        if api.request_timeout_secs < needed {
            errors.push(ValidationError::new(
                "api.request_timeout_secs",
                format!(
                    "{}s cannot cover a full bulk request; needs at least {}s",
                    api.request_timeout_secs, needed
                ),
            ));
        }
    }

    let observability = &config.observability;
    if !matches!(
        observability.log_level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", observability.log_level),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Worst-case duration of a maximal bulk request: one lookup deadline per wave.
pub fn bulk_budget_secs(config: &TrackerConfig) -> Option<u64> {
    let api = &config.api;
    if api.max_bulk == 0 || api.bulk_concurrency == 0 {
        return None;
    }
    let waves = api.max_bulk.div_ceil(api.bulk_concurrency) as u64;
    Some(waves * config.upstream.lookup_timeout_secs)
}
