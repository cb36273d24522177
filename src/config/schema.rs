//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the tracker.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the tracking service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TrackerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream portal settings.
    pub upstream: UpstreamConfig,

    /// Public API limits and behavior.
    pub api: ApiConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Upstream tracking portal configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Portal home page, visited first to obtain session cookies.
    pub base_url: String,

    /// ASP.NET tracking form page.
    pub tracking_url: String,

    /// Value sent in the `Origin` header of the form post.
    pub origin: String,

    /// Visit `base_url` before the form page.
    pub warm_up: bool,

    /// Total timeout per upstream request in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Deadline for one whole lookup session (every step and pause) in seconds.
    pub lookup_timeout_secs: u64,

    /// Pause between session steps in milliseconds.
    pub step_delay_ms: u64,

    /// Browser User-Agent presented to the portal.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mis.cept.gov.in/".to_string(),
            tracking_url: "https://mis.cept.gov.in/General/IPS_Track.aspx".to_string(),
            origin: "https://mis.cept.gov.in".to_string(),
            warm_up: true,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            lookup_timeout_secs: 60,
            step_delay_ms: 500,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// API behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Maximum tracking numbers accepted by the bulk endpoint.
    pub max_bulk: usize,

    /// Number of bulk lookups in flight at once.
    pub bulk_concurrency: usize,

    /// Reject identifiers that do not have the XX123456789XX shape.
    pub strict_validation: bool,

    /// Whole-request timeout in seconds. Must cover a full bulk fan-out:
    /// `ceil(max_bulk / bulk_concurrency) * upstream.lookup_timeout_secs`.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Allow cross-origin requests from any origin.
    pub cors_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_bulk: 10,
            bulk_concurrency: 5,
            strict_validation: false,
            request_timeout_secs: 180,
            max_body_size: 64 * 1024,
            cors_enabled: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
