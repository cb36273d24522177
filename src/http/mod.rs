//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID)
//!     → middleware/ (per-route metrics)
//!     → handlers.rs (validate input, invoke tracker)
//!     → response.rs (envelope or error shape)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, ErrorBody, HealthResponse, TrackingResponse};
pub use server::{AppState, HttpServer};
