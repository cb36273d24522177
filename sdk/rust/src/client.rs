//! Client for the India Post tracking API.

use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the request (4xx/5xx).
    #[error("tracking API returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid base URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("base URL cannot carry a path: {0}")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub date: String,
    pub time: String,
    pub office: String,
    pub event: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightInfo {
    #[serde(rename = "flightNumber")]
    pub flight_number: Option<String>,
    pub airline: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSummary {
    #[serde(rename = "hasFlightEvents")]
    pub has_flight_events: bool,
    #[serde(rename = "flightEventCount")]
    pub flight_event_count: usize,
    pub flights: Vec<FlightInfo>,
}

/// One tracking envelope.
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

/// Lookup flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackOptions {
    pub demo: bool,
    pub flight_only: bool,
}

#[derive(Serialize)]
struct BulkRequest<'a> {
    tracking_numbers: &'a [String],
    demo: bool,
    #[serde(rename = "flightOnly")]
    flight_only: bool,
}

pub struct TrackerClient {
    client: Client,
    base_url: String,
}

impl TrackerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn health(&self) -> Result<HealthResponse, SdkError> {
        let resp = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        decode(resp).await
    }

    /// Track one article via `GET /track/{tracking_number}`.
    ///
    /// The identifier travels as a single percent-encoded path segment.
    pub async fn track(&self, tracking_number: &str, options: TrackOptions) -> Result<TrackingResponse, SdkError> {
        let resp = self
            .client
            .get(self.track_url(tracking_number)?)
            .query(&[
                ("demo", options.demo.to_string()),
                ("flightOnly", options.flight_only.to_string()),
            ])
            .send()
            .await?;
        decode(resp).await
    }

    fn track_url(&self, tracking_number: &str) -> Result<Url, SdkError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| SdkError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("track")
            .push(tracking_number);
        Ok(url)
    }

    /// Track several articles; results come back in input order.
    pub async fn track_bulk(
        &self,
        tracking_numbers: &[String],
        options: TrackOptions,
    ) -> Result<Vec<TrackingResponse>, SdkError> {
        let body = BulkRequest {
            tracking_numbers,
            demo: options.demo,
            flight_only: options.flight_only,
        };
        let resp = self
            .client
            .post(format!("{}/track/bulk", self.base_url))
            .json(&body)
            .send()
            .await?;
        decode(resp).await
    }

    /// Perform a raw GET against the API.
    pub async fn get(&self, path: &str) -> Result<Response, reqwest::Error> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, SdkError> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(SdkError::Api { status, body: text });
    }

    Ok(serde_json::from_str(&text)?)
}
