//! Tracking domain types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tracking::number::TrackingNumber;

/// Name of the upstream portal, reported as `source` on every record.
pub const SOURCE: &str = "MIS CEPT";

/// A single row of shipment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub date: String,
    pub time: String,
    /// Handling office; empty when the portal does not report it.
    pub office: String,
    pub event: String,
    pub location: Option<String>,
}

/// How a lookup is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// Scrape the upstream portal.
    Live,
    /// Return canned data without touching the network.
    Demo,
}

impl LookupMode {
    pub fn from_demo_flag(demo: bool) -> Self {
        if demo {
            Self::Demo
        } else {
            Self::Live
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Demo => "demo",
        }
    }
}

/// Normalized result of one lookup.
///
/// A failed lookup is still a record: `error` is set and `status` is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingRecord {
    pub tracking_number: String,
    pub status: Option<String>,
    pub events: Vec<TrackingEvent>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub booked_on: Option<String>,
    pub delivered_on: Option<String>,
    pub article_type: Option<String>,
    pub error: Option<String>,
    pub source: &'static str,
}

impl TrackingRecord {
    /// Build the record reported when a lookup fails.
    pub fn failed(number: &TrackingNumber, error: &TrackingError) -> Self {
        Self {
            tracking_number: number.to_string(),
            status: None,
            events: Vec::new(),
            origin: None,
            destination: None,
            booked_on: None,
            delivered_on: None,
            article_type: None,
            error: Some(error.to_string()),
            source: SOURCE,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Article summary fields found on a results page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub booked_on: Option<String>,
    pub delivered_on: Option<String>,
    pub article_type: Option<String>,
}

/// Structured content extracted from a results page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub events: Vec<TrackingEvent>,
    pub summary: Summary,
    /// Text of the portal's status label, when it names a known state.
    pub status_label: Option<String>,
}

/// Form state needed to submit a tracking request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPage {
    /// ASP.NET hidden fields, in page order.
    pub hidden_fields: Vec<(String, String)>,
    /// Name of the text input that takes the tracking number.
    pub input_field: Option<String>,
    /// Name of a submit input to send as the clicked button.
    pub submit_button: Option<String>,
    /// `__doPostBack` target wired to a submit button.
    pub postback_target: Option<String>,
}

impl FormPage {
    pub fn hidden(&self, name: &str) -> Option<&str> {
        self.hidden_fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Broad class of a lookup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The portal could not be reached or answered with an error status.
    Unavailable,
    /// The portal answered but the content was not usable.
    Unrecognized,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Errors that can occur while talking to or reading the portal.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Upstream request timed out.
    #[error("Request to MIS CEPT timed out after {0} seconds")]
    Timeout(u64),

    /// Connection or protocol failure.
    #[error("Network error from MIS CEPT: {0}")]
    Network(String),

    /// Portal answered with a non-2xx status.
    #[error("MIS CEPT returned HTTP {0}")]
    UpstreamStatus(u16),

    /// Portal kept redirecting past the hop limit.
    #[error("MIS CEPT redirected more than {0} times")]
    TooManyRedirects(usize),

    /// Portal answered 2xx with no content.
    #[error("MIS CEPT returned an empty response")]
    EmptyBody,

    /// Tracking form page had no ASP.NET view state.
    #[error("Could not extract form state from MIS CEPT. Session may have expired.")]
    FormState,

    /// Portal reported an error for this article.
    #[error("Tracking number not found: {0}")]
    NotFound(String),

    /// Results page held neither events nor a status.
    #[error("Tracking number not found or unrecognized response format")]
    Unrecognized,

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl TrackingError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout(_)
            | Self::Network(_)
            | Self::UpstreamStatus(_)
            | Self::TooManyRedirects(_)
            | Self::EmptyBody
            | Self::Client(_) => FailureKind::Unavailable,
            Self::FormState | Self::NotFound(_) | Self::Unrecognized => FailureKind::Unrecognized,
        }
    }
}

/// Result type for tracking operations.
pub type TrackingResult<T> = Result<T, TrackingError>;
