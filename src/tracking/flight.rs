//! Flight leg detection.
//!
//! Air legs show up as events whose location reads like
//! `Flight - AI0187 (DEL to YYZ)`.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tracking::types::TrackingEvent;

static FLIGHT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2,3}\d{1,4})\b").expect("static pattern is valid"));
static FROM_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfrom\s+([A-Za-z][A-Za-z ]*?)\s+to\s+([A-Za-z][A-Za-z ]*[A-Za-z])")
        .expect("static pattern is valid")
});
static AIRPORT_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z]{3})\s*(?:-|–|\bto\b)\s*([A-Z]{3})\b").expect("static pattern is valid")
});

/// One flight leg found in the event history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightInfo {
    #[serde(rename = "flightNumber")]
    pub flight_number: Option<String>,
    pub airline: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

/// Flight legs of a shipment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightSummary {
    #[serde(rename = "hasFlightEvents")]
    pub has_flight_events: bool,
    #[serde(rename = "flightEventCount")]
    pub flight_event_count: usize,
    pub flights: Vec<FlightInfo>,
}

pub fn is_flight_event(event: &TrackingEvent) -> bool {
    event
        .location
        .as_deref()
        .is_some_and(|location| location.to_lowercase().contains("flight"))
}

pub fn filter_flight_events(events: &[TrackingEvent]) -> Vec<TrackingEvent> {
    events.iter().filter(|e| is_flight_event(e)).cloned().collect()
}

/// Pull flight number, airline and route out of a location string.
pub fn extract_flight_info(location: &str) -> Option<FlightInfo> {
    if location.trim().is_empty() {
        return None;
    }

    let flight_number = FLIGHT_NUMBER
        .captures(&location.to_uppercase())
        .map(|caps| caps[1].to_string());

    let airline = flight_number.as_ref().map(|number| {
        number
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .collect::<String>()
    });

    let (origin, destination) = if let Some(caps) = FROM_TO.captures(location) {
        (Some(caps[1].trim().to_string()), Some(caps[2].trim().to_string()))
    } else if let Some(caps) = AIRPORT_PAIR.captures(location) {
        (Some(caps[1].to_string()), Some(caps[2].to_string()))
    } else {
        (None, None)
    };

    Some(FlightInfo {
        flight_number,
        airline,
        origin,
        destination,
    })
}

/// Summarize the flight legs in `events`, one entry per distinct flight.
pub fn flight_summary(events: &[TrackingEvent]) -> FlightSummary {
    let flight_events: Vec<&TrackingEvent> = events.iter().filter(|e| is_flight_event(e)).collect();

    let mut seen = HashSet::new();
    let flights = flight_events
        .iter()
        .filter_map(|event| {
            let location = event.location.as_deref().unwrap_or_default();
            let info = extract_flight_info(location)?;
            let key = info
                .flight_number
                .clone()
                .unwrap_or_else(|| location.to_lowercase());
            seen.insert(key).then_some(info)
        })
        .collect();

    FlightSummary {
        has_flight_events: !flight_events.is_empty(),
        flight_event_count: flight_events.len(),
        flights,
    }
}
