//! Tracking subsystem.
//!
//! # Data Flow
//! ```text
//! raw id
//!     → number.rs (normalize, optional strict format check)
//!     → tracker.rs (demo or live)
//!         → upstream.rs (session: home → form → post, redirects followed)
//!             → cookies.rs (per-session cookie jar)
//!         → parser.rs (form state, events, summary)
//!         → status.rs (status derivation, date back-fill)
//!     → TrackingRecord
//!     → flight.rs (flight legs, on request)
//! ```

pub mod cookies;
pub mod demo;
pub mod flight;
pub mod number;
pub mod parser;
pub mod status;
pub mod tracker;
pub mod types;
pub mod upstream;

pub use cookies::CookieJar;
pub use flight::{filter_flight_events, flight_summary, FlightInfo, FlightSummary};
pub use number::{InvalidTrackingNumber, TrackingNumber};
pub use parser::{CeptParser, MarkupParser};
pub use tracker::Tracker;
pub use types::{
    FailureKind, FormPage, LookupMode, ParsedPage, Summary, TrackingError, TrackingEvent,
    TrackingRecord, TrackingResult, SOURCE,
};
pub use upstream::UpstreamClient;
