//! India Post tracking API.
//!
//! Scrapes the MIS CEPT portal and serves normalized tracking records as JSON.

// Core subsystems
pub mod config;
pub mod http;
pub mod tracking;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::TrackerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use tracking::Tracker;
