//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP layer and tracker produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID attached to every HTTP span
//! - Metrics are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
