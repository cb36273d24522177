//! Status derivation and date back-filling.

use crate::tracking::types::{ParsedPage, TrackingEvent};

pub const DELIVERED: &str = "Delivered";
pub const OUT_FOR_DELIVERY: &str = "Out for Delivery";
pub const IN_TRANSIT: &str = "In Transit";
pub const BOOKED: &str = "Booked";
pub const RETURNED: &str = "Returned";

/// Map free text from the portal onto a known status, if it names one.
pub fn classify_status(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    if text.contains("out for delivery") {
        Some(OUT_FOR_DELIVERY)
    } else if text.contains("return") {
        Some(RETURNED)
    } else if text.contains("deliver") {
        Some(DELIVERED)
    } else if text.contains("transit") || text.contains("dispatch") {
        Some(IN_TRANSIT)
    } else if text.contains("book") {
        Some(BOOKED)
    } else {
        None
    }
}

/// Current status of the article.
///
/// The newest event wins (the portal lists newest first); an unclassified
/// event is reported verbatim. Without events the status label is used.
pub fn derive_status(page: &ParsedPage) -> Option<String> {
    if let Some(latest) = page.events.first() {
        return Some(
            classify_status(&latest.event)
                .map(str::to_string)
                .unwrap_or_else(|| latest.event.clone()),
        );
    }

    page.status_label
        .as_deref()
        .and_then(classify_status)
        .map(str::to_string)
}

/// Fill `booked_on` / `delivered_on` from events when the portal left them out.
pub fn backfill_dates(
    events: &[TrackingEvent],
    status: Option<&str>,
    booked_on: &mut Option<String>,
    delivered_on: &mut Option<String>,
) {
    if booked_on.is_none() {
        *booked_on = events
            .iter()
            .rev()
            .find(|e| e.event.to_lowercase().contains("book") && !e.date.is_empty())
            .map(|e| e.date.clone());
    }

    if delivered_on.is_none() && status == Some(DELIVERED) {
        *delivered_on = events
            .iter()
            .find(|e| classify_status(&e.event) == Some(DELIVERED) && !e.date.is_empty())
            .map(|e| e.date.clone());
    }
}
