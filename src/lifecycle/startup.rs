//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Build the tracker and HTTP server
//! - Bind the listener last

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::TrackerConfig;
use crate::http::HttpServer;
use crate::observability::metrics;
use crate::tracking::TrackingError;

/// Fatal errors during startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("Failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Failed to build tracker: {0}")]
    Tracker(#[from] TrackingError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bring up every subsystem and return a server ready to run.
pub async fn start(config: TrackerConfig) -> Result<(HttpServer, TcpListener), StartupError> {
    if config.observability.metrics_enabled {
        let address = &config.observability.metrics_address;
        let addr: SocketAddr = address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address.clone(),
            source,
        })?;

    Ok((server, listener))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_binds_ephemeral_port() {
        let mut config = TrackerConfig::default();
        config.listener.bind_address = "127.0.0.1:0".into();

        let (_server, listener) = start(config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_bind_failure_names_address() {
        let mut config = TrackerConfig::default();
        config.listener.bind_address = "256.0.0.1:80".into();

        let error = start(config).await.unwrap_err();
        assert!(error.to_string().contains("256.0.0.1:80"));
    }
}
