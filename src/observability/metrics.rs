//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tracker_http_requests_total` (counter): requests by method, route, status
//! - `tracker_http_request_duration_seconds` (histogram): request latency
//! - `tracker_lookups_total` (counter): lookups by mode and outcome
//! - `tracker_lookup_duration_seconds` (histogram): lookup latency by mode
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::Label;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    ::metrics::describe_counter!("tracker_http_requests_total", "HTTP requests served");
    ::metrics::describe_histogram!(
        "tracker_http_request_duration_seconds",
        ::metrics::Unit::Seconds,
        "HTTP request latency"
    );
    ::metrics::describe_counter!("tracker_lookups_total", "Tracking lookups performed");
    ::metrics::describe_histogram!(
        "tracker_lookup_duration_seconds",
        ::metrics::Unit::Seconds,
        "Tracking lookup latency"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = vec![
        Label::new("method", method.to_string()),
        Label::new("route", route.to_string()),
        Label::new("status", status.to_string()),
    ];
    ::metrics::counter!("tracker_http_requests_total", labels.clone()).increment(1);
    ::metrics::histogram!("tracker_http_request_duration_seconds", labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_lookup(mode: &'static str, outcome: &'static str, start: Instant) {
    ::metrics::counter!("tracker_lookups_total", "mode" => mode, "outcome" => outcome).increment(1);
    ::metrics::histogram!("tracker_lookup_duration_seconds", "mode" => mode)
        .record(start.elapsed().as_secs_f64());
}
