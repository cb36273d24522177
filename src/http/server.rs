//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, CORS, metrics)
//! - Bind server to listener
//! - Stop accepting on shutdown and drain in-flight requests

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    http::Request,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    BoxError, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::{ApiConfig, TrackerConfig};
use crate::http::handlers;
use crate::http::middleware::track_metrics;
use crate::http::request::{propagate_request_id_layer, request_id_of, set_request_id_layer};
use crate::http::response::ApiError;
use crate::tracking::{Tracker, TrackingResult};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Tracker>,
    pub api: ApiConfig,
}

/// HTTP server for the tracking API.
#[derive(Debug)]
pub struct HttpServer {
    router: Router,
    config: TrackerConfig,
}

/// Map a middleware failure onto the JSON error shape.
fn request_failed(error: BoxError, timeout_secs: u64) -> axum::response::Response {
    if error.is::<Elapsed>() {
        tracing::warn!(timeout_secs, "Request timed out");
        ApiError::Timeout(timeout_secs).into_response()
    } else {
        tracing::error!(error = %error, "Unhandled middleware error");
        ApiError::Internal(error.to_string()).into_response()
    }
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails only if the outbound HTTP client cannot be built.
    pub fn new(config: TrackerConfig) -> TrackingResult<Self> {
        let tracker = Arc::new(Tracker::new(config.upstream.clone())?);
        Ok(Self::with_tracker(config, tracker))
    }

    /// Create a server around an existing tracker.
    pub fn with_tracker(config: TrackerConfig, tracker: Arc<Tracker>) -> Self {
        let state = AppState {
            tracker,
            api: config.api.clone(),
        };
        let router = Self::build_router(&config.api, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(api: &ApiConfig, state: AppState) -> Router {
        let timeout_secs = api.request_timeout_secs;
        let router = Router::new()
            .route("/", get(handlers::health))
            .route("/health", get(handlers::health))
            .route("/track", get(handlers::track_by_query))
            .route("/track/bulk", post(handlers::track_bulk))
            .route("/track/{tracking_number}", get(handlers::track_by_path))
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(api.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(move |error: BoxError| async move {
                        request_failed(error, timeout_secs)
                    }))
                    .timeout(Duration::from_secs(timeout_secs)),
            )
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id_of(request),
                )
            }))
            .layer(set_request_id_layer());

        if api.cors_enabled {
            router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        } else {
            router
        }
    }

    /// The fully layered router, for driving without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.tracking_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}
