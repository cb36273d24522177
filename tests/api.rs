//! Router-level tests driven with `oneshot`.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{MockPortal, MockResponse};
use indiapost_tracker::config::TrackerConfig;
use indiapost_tracker::HttpServer;

/// Portal that answers 500 to everything, so any live call is visible.
async fn counting_portal() -> MockPortal {
    MockPortal::start(|_| MockResponse::status(500)).await
}

fn router(config: TrackerConfig) -> Router {
    HttpServer::new(config).unwrap().router()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn assert_error_shape(body: &Value) {
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_endpoints_never_call_portal() {
    let portal = counting_portal().await;
    let app = router(portal.tracker_config());

    for uri in ["/", "/health"] {
        let (status, body) = send(app.clone(), get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "India Post Tracking API");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["timestamp"].is_string());
    }

    assert_eq!(portal.call_count(), 0);
}

#[tokio::test]
async fn test_demo_lookup_by_path() {
    let portal = counting_portal().await;
    let app = router(portal.tracker_config());

    let (status, body) = send(app, get("/track/ee123456785in?demo=true")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["tracking_number"], "EE123456785IN");
    assert_eq!(body["status"], "Delivered");
    assert_eq!(body["source"], "MIS CEPT");
    assert_eq!(body["events"].as_array().unwrap().len(), 5);
    assert_eq!(body["origin"], "Delhi");
    assert_eq!(body["destination"], "Mumbai");
    assert!(body["error"].is_null());
    assert_eq!(body["flightSummary"]["hasFlightEvents"], false);
    assert_eq!(portal.call_count(), 0);
}

#[tokio::test]
async fn test_demo_lookup_by_query_with_flight_filter() {
    let portal = counting_portal().await;
    let app = router(portal.tracker_config());

    let (status, body) = send(app, get("/track?id=LP951627598IN&demo=true&flightOnly=true")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["tracking_number"], "LP951627598IN");
    assert!(body["events"].as_array().unwrap().is_empty());
    assert_eq!(portal.call_count(), 0);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let portal = counting_portal().await;
    let app = router(portal.tracker_config());

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    let generated = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "caller-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "caller-42");
}

#[tokio::test]
async fn test_missing_or_blank_id_is_rejected() {
    let portal = counting_portal().await;
    let app = router(portal.tracker_config());

    let (status, body) = send(app.clone(), get("/track")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body);

    let (status, body) = send(app.clone(), get("/track?id=%20%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body);

    let (status, body) = send(app, get("/track/%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body);

    assert_eq!(portal.call_count(), 0);
}

#[tokio::test]
async fn test_bulk_preserves_order() {
    let portal = counting_portal().await;
    let app = router(portal.tracker_config());

    let ids = ["ee123456785in", "LP951627598IN", " cp000000001in "];
    let (status, body) = send(
        app,
        post_json("/track/bulk", &json!({ "tracking_numbers": ids, "demo": true })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let envelopes = body.as_array().unwrap();
    let numbers: Vec<&str> = envelopes
        .iter()
        .map(|e| e["tracking_number"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, ["EE123456785IN", "LP951627598IN", "CP000000001IN"]);
    assert!(envelopes.iter().all(|e| e["success"] == true));
    assert_eq!(portal.call_count(), 0);
}

#[tokio::test]
async fn test_bulk_size_limits() {
    let portal = counting_portal().await;
    let app = router(portal.tracker_config());

    let empty: Vec<String> = Vec::new();
    let (status, body) = send(
        app.clone(),
        post_json("/track/bulk", &json!({ "tracking_numbers": empty })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body);

    let eleven: Vec<String> = (0..11).map(|i| format!("LP{:09}IN", i)).collect();
    let (status, body) = send(
        app.clone(),
        post_json("/track/bulk", &json!({ "tracking_numbers": eleven })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Maximum 10"));

    let ten: Vec<String> = (0..10).map(|i| format!("LP{:09}IN", i)).collect();
    let (status, body) = send(
        app,
        post_json("/track/bulk", &json!({ "tracking_numbers": ten, "demo": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 10);

    assert_eq!(portal.call_count(), 0);
}

#[tokio::test]
async fn test_bulk_malformed_body() {
    let portal = counting_portal().await;
    let app = router(portal.tracker_config());

    let request = Request::builder()
        .method("POST")
        .uri("/track/bulk")
        .header("content-type", "application/json")
        .body(Body::from("{\"tracking_numbers\": ["))
        .unwrap();
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body);

    let (status, body) = send(app, post_json("/track/bulk", &json!({ "ids": ["x"] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body);

    assert_eq!(portal.call_count(), 0);
}

#[tokio::test]
async fn test_strict_validation() {
    let portal = counting_portal().await;
    let mut config = portal.tracker_config();
    config.api.strict_validation = true;
    let app = router(config);

    let (status, body) = send(app.clone(), get("/track/ABC123")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("XX123456789XX"));

    let (status, _) = send(
        app.clone(),
        post_json(
            "/track/bulk",
            &json!({ "tracking_numbers": ["LP951627598IN", "nope"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(portal.call_count(), 0);

    let (status, body) = send(app, get("/track/lp951627598in?demo=true")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_upstream_failure_is_still_200() {
    let portal = counting_portal().await;
    let app = router(portal.tracker_config());

    let (status, body) = send(app, get("/track/LP951627598IN")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["status"].is_null());
    assert!(body["events"].as_array().unwrap().is_empty());
    assert_eq!(body["error"], "MIS CEPT returned HTTP 500");
    assert_eq!(portal.call_count(), 1);
}

#[tokio::test]
async fn test_undecodable_path_is_json_400() {
    let portal = counting_portal().await;
    let app = router(portal.tracker_config());

    let (status, body) = send(app, get("/track/%FF%FE")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body);
    assert_eq!(portal.call_count(), 0);
}

#[tokio::test]
async fn test_request_timeout_is_json_408() {
    let portal = MockPortal::start(|_| {
        MockResponse::html("<html>home</html>").delayed(std::time::Duration::from_secs(3))
    })
    .await;
    let mut config = portal.tracker_config();
    config.api.request_timeout_secs = 1;
    let app = router(config);

    let (status, body) = send(app, get("/track/LP951627598IN")).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_error_shape(&body);
    assert_eq!(body["error"], "Request did not complete within 1 seconds");
}
