//! Canned record served in demo mode.

use crate::tracking::number::TrackingNumber;
use crate::tracking::status::DELIVERED;
use crate::tracking::types::{TrackingEvent, TrackingRecord, SOURCE};

const DEMO_EVENTS: [(&str, &str, &str, &str, &str); 5] = [
    ("17-Jan-2025", "10:30", "MUMBAI GPO", "Item Delivered", "Mumbai"),
    ("16-Jan-2025", "08:15", "MUMBAI GPO", "Out for Delivery", "Mumbai"),
    ("15-Jan-2025", "14:20", "MUMBAI NSH", "Item Received", "Mumbai"),
    ("14-Jan-2025", "09:00", "DELHI NSH", "Item Dispatched", "Delhi"),
    ("13-Jan-2025", "16:45", "DELHI GPO", "Item Booked", "Delhi"),
];

/// Fixed delivered shipment from Delhi to Mumbai, stamped with `number`.
pub fn demo_record(number: &TrackingNumber) -> TrackingRecord {
    let events = DEMO_EVENTS
        .iter()
        .map(|(date, time, office, event, location)| TrackingEvent {
            date: date.to_string(),
            time: time.to_string(),
            office: office.to_string(),
            event: event.to_string(),
            location: Some(location.to_string()),
        })
        .collect();

    TrackingRecord {
        tracking_number: number.to_string(),
        status: Some(DELIVERED.to_string()),
        events,
        origin: Some("Delhi".to_string()),
        destination: Some("Mumbai".to_string()),
        booked_on: Some("13-Jan-2025".to_string()),
        delivered_on: Some("17-Jan-2025".to_string()),
        article_type: Some("Speed Post".to_string()),
        error: None,
        source: SOURCE,
    }
}
