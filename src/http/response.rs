//! Response shapes.
//!
//! # Responsibilities
//! - Envelope returned for each tracking lookup
//! - Liveness payload
//! - Caller error shape and its status code mapping
//!
//! # Design Decisions
//! - Lookup failures are data: they ride inside a 200 envelope
//! - Only caller mistakes produce 4xx, and always in the same JSON shape

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tracking::{
    filter_flight_events, flight_summary, FlightSummary, InvalidTrackingNumber, TrackingEvent,
    TrackingRecord,
};

pub const SERVICE_NAME: &str = "India Post Tracking API";

/// Current UTC time in RFC 3339 with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Per-lookup JSON envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub success: bool,
    pub tracking_number: String,
    pub status: Option<String>,
    pub events: Vec<TrackingEvent>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub booked_on: Option<String>,
    pub delivered_on: Option<String>,
    pub article_type: Option<String>,
    pub error: Option<String>,
    pub source: String,
    #[serde(rename = "flightSummary")]
    pub flight_summary: FlightSummary,
    pub timestamp: String,
}

impl TrackingResponse {
    /// Wrap a record. With `flight_only`, `events` keeps only flight legs;
    /// the flight summary always covers the full history.
    pub fn from_record(record: TrackingRecord, flight_only: bool) -> Self {
        let flight_summary = flight_summary(&record.events);
        let events = if flight_only {
            filter_flight_events(&record.events)
        } else {
            record.events
        };

        Self {
            success: record.error.is_none(),
            tracking_number: record.tracking_number,
            status: record.status,
            events,
            origin: record.origin,
            destination: record.destination,
            booked_on: record.booked_on,
            delivered_on: record.delivered_on,
            article_type: record.article_type,
            error: record.error,
            source: record.source.to_string(),
            flight_summary,
            timestamp: timestamp(),
        }
    }
}

/// Liveness payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: timestamp(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub timestamp: String,
}

/// Errors caused by the caller's request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    InvalidTrackingNumber(#[from] InvalidTrackingNumber),

    #[error("Request did not complete within {0} seconds")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::InvalidTrackingNumber(_) => StatusCode::BAD_REQUEST,
            Self::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(status = %status, error = %self, "Rejecting request");

        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            timestamp: timestamp(),
        };
        (status, Json(body)).into_response()
    }
}
