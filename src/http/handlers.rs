//! Route handlers.
//!
//! Input is validated completely before the tracker is invoked, so a
//! rejected request never reaches the portal.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;

use crate::http::response::{ApiError, HealthResponse, TrackingResponse};
use crate::http::server::AppState;
use crate::tracking::{LookupMode, TrackingNumber};

/// Flags shared by the single-lookup routes.
#[derive(Debug, Default, Deserialize)]
pub struct TrackOptions {
    #[serde(default)]
    pub demo: bool,
    #[serde(default, rename = "flightOnly")]
    pub flight_only: bool,
}

/// Query string of `GET /track`.
#[derive(Debug, Default, Deserialize)]
pub struct TrackQuery {
    pub id: Option<String>,
    #[serde(default)]
    pub demo: bool,
    #[serde(default, rename = "flightOnly")]
    pub flight_only: bool,
}

/// Body of `POST /track/bulk`.
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub tracking_numbers: Vec<String>,
    #[serde(default)]
    pub demo: bool,
    #[serde(default, rename = "flightOnly")]
    pub flight_only: bool,
}

/// `GET /` and `GET /health`.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// `GET /track/{tracking_number}`.
pub async fn track_by_path(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    options: Result<Query<TrackOptions>, QueryRejection>,
) -> Result<Json<TrackingResponse>, ApiError> {
    let Path(tracking_number) = path.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let Query(options) = options.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    track_one(&state, &tracking_number, options.demo, options.flight_only).await
}

/// `GET /track?id=…`.
pub async fn track_by_query(
    State(state): State<AppState>,
    query: Result<Query<TrackQuery>, QueryRejection>,
) -> Result<Json<TrackingResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let id = query.id.ok_or_else(|| {
        ApiError::BadRequest(
            "Missing tracking number. Use /track/{tracking_number} or /track?id=...".to_string(),
        )
    })?;
    track_one(&state, &id, query.demo, query.flight_only).await
}

async fn track_one(
    state: &AppState,
    raw: &str,
    demo: bool,
    flight_only: bool,
) -> Result<Json<TrackingResponse>, ApiError> {
    let number = state.parse_number(raw)?;
    let record = state
        .tracker
        .lookup(&number, LookupMode::from_demo_flag(demo))
        .await;
    Ok(Json(TrackingResponse::from_record(record, flight_only)))
}

/// `POST /track/bulk`: one envelope per input, in input order.
pub async fn track_bulk(
    State(state): State<AppState>,
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> Result<Json<Vec<TrackingResponse>>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.tracking_numbers.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one tracking number is required".to_string(),
        ));
    }
    if request.tracking_numbers.len() > state.api.max_bulk {
        return Err(ApiError::BadRequest(format!(
            "Maximum {} tracking numbers allowed per request",
            state.api.max_bulk
        )));
    }

    let numbers = request
        .tracking_numbers
        .iter()
        .map(|raw| state.parse_number(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mode = LookupMode::from_demo_flag(request.demo);
    let flight_only = request.flight_only;
    tracing::info!(
        count = numbers.len(),
        mode = mode.as_str(),
        concurrency = state.api.bulk_concurrency,
        "Bulk lookup"
    );

    let responses = stream::iter(numbers)
        .map(|number| {
            let tracker = state.tracker.clone();
            async move {
                let record = tracker.lookup(&number, mode).await;
                TrackingResponse::from_record(record, flight_only)
            }
        })
        .buffered(state.api.bulk_concurrency)
        .collect::<Vec<_>>()
        .await;

    Ok(Json(responses))
}

impl AppState {
    /// Normalize a caller-supplied identifier, enforcing the article shape
    /// when strict validation is on.
    pub fn parse_number(&self, raw: &str) -> Result<TrackingNumber, ApiError> {
        let number = if self.api.strict_validation {
            TrackingNumber::parse_strict(raw)?
        } else {
            TrackingNumber::parse(raw)?
        };
        Ok(number)
    }
}
