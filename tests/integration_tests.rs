//! End-to-end tests for the proxy pipeline.
//!
//! These tests stand up two in-process servers: a stub upstream that plays
//! the CWA open-data API (canned dataset, error statuses, invalid JSON) and
//! the proxy itself pointed at it. Requests go through the real router,
//! middleware, and `reqwest` client, so the full HTTP contract is exercised
//! without touching the network.
//!
//! Run with: `cargo test --test integration_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::{OriginalUri, State};
use axum::http::{Response, StatusCode};
use axum::routing::any;
use reqwest::Client;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::sleep;

use cwa_proxy::{AppState, Config, build_router};

/// Requests the stub upstream has received, as `path?query` strings.
type RequestLog = Arc<Mutex<Vec<String>>>;

/// Canned dataset with locations A, B, C plus the mountain stations the
/// real feed carries.
fn canned_dataset() -> Value {
    let record = |name: &str| {
        json!({
            "LocationName": name,
            "Geocode": format!("{name}-code"),
            "WeatherElement": [{"ElementName": "MaxT", "Value": "12"}],
        })
    };

    json!({
        "cwaopendata": {
            "identifier": "F-B0053-033",
            "Dataset": {
                "DatasetInfo": {"DatasetDescription": "mountain forecast"},
                "Locations": {
                    "Location": [
                        record("A"),
                        record("B"),
                        record("C"),
                        record("向陽山"),
                    ]
                },
            },
        }
    })
}

/// Stub upstream handler: records the request and answers by path.
async fn stub_upstream(
    State(log): State<RequestLog>,
    OriginalUri(uri): OriginalUri,
) -> Response<Body> {
    log.lock().unwrap().push(
        uri.path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_else(|| uri.path().to_string()),
    );

    let (status, content_type, body) = match uri.path() {
        "/data/weather" => (
            StatusCode::OK,
            "application/json",
            canned_dataset().to_string(),
        ),
        "/data/notjson" => (
            StatusCode::OK,
            "text/plain",
            "<!doctype html><p>maintenance window</p>".to_string(),
        ),
        "/data/othershape" => (
            StatusCode::OK,
            "application/json",
            json!({"records": {"datasetDescription": "township forecast"}}).to_string(),
        ),
        "/data/teapot" => (
            StatusCode::IM_A_TEAPOT,
            "text/plain",
            "short and stout".to_string(),
        ),
        _ => (
            StatusCode::BAD_GATEWAY,
            "text/plain",
            "upstream says no".to_string(),
        ),
    };

    Response::builder()
        .status(status)
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap()
}

/// Test fixture running the stub upstream and the proxy.
struct TestFixture {
    base_url: String,
    client: Client,
    upstream_requests: RequestLog,
}

impl TestFixture {
    /// Start both servers on ephemeral ports and wait for readiness.
    async fn new() -> Self {
        let log: RequestLog = Arc::new(Mutex::new(Vec::new()));

        // Stub upstream
        let stub = Router::new()
            .fallback(any(stub_upstream))
            .with_state(log.clone());
        let upstream_addr = Self::serve(stub).await;

        // Proxy under test
        let config = Config {
            host: "127.0.0.1".to_string(),
            upstream_base_url: format!("http://{upstream_addr}"),
            default_location: "向陽山".to_string(),
            metrics_port: 0,
            ..Config::default()
        };
        let state = AppState::new(config).expect("Failed to build app state");
        let app_addr = Self::serve(build_router(state)).await;

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        let fixture = Self {
            base_url: format!("http://{app_addr}"),
            client,
            upstream_requests: log,
        };
        fixture.wait_for_ready().await;
        fixture
    }

    /// Bind an ephemeral port and serve the router in the background.
    async fn serve(app: Router) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind ephemeral port");
        let addr = listener.local_addr().expect("Failed to read local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server crashed");
        });

        addr
    }

    /// Poll /health until the proxy answers.
    async fn wait_for_ready(&self) {
        for _ in 0..50 {
            if let Ok(response) = self
                .client
                .get(format!("{}/health", self.base_url))
                .send()
                .await
                && response.status() == StatusCode::OK
            {
                return;
            }
            sleep(Duration::from_millis(50)).await;
        }
        panic!("Proxy did not become ready");
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{path_and_query}", self.base_url)
    }

    fn last_upstream_request(&self) -> String {
        self.upstream_requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("No upstream request recorded")
    }
}

// =============================================================================
// Route Resolution
// =============================================================================

#[tokio::test]
async fn missing_route_returns_400_with_debug_fields() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/nowhere/special?format=JSON&x=1"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "missing_route");
    assert_eq!(body["path"], "/nowhere/special");
    assert_eq!(body["query"], "format=JSON&x=1");
}

#[tokio::test]
async fn path_parameter_drives_the_upstream_target() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url(
            "/?path=data/weather&Authorization=CWA-KEY&format=JSON&locationName=B",
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // The routing parameter is consumed; everything else is forwarded
    // verbatim and in order
    assert_eq!(
        fixture.last_upstream_request(),
        "/data/weather?Authorization=CWA-KEY&format=JSON&locationName=B"
    );
}

#[tokio::test]
async fn prefixed_path_is_stripped_when_parameter_is_absent() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/cwa-proxy/data/weather?Authorization=CWA-KEY&locationName=A"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        fixture.last_upstream_request(),
        "/data/weather?Authorization=CWA-KEY&locationName=A"
    );
}

#[tokio::test]
async fn traversal_paths_are_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/?path=data/../../secrets"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    // Nothing must reach the upstream
    assert!(fixture.upstream_requests.lock().unwrap().is_empty());
}

// =============================================================================
// Upstream Failure Relay
// =============================================================================

#[tokio::test]
async fn upstream_error_status_is_relayed_as_plain_text() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/cwa-proxy/data/teapot"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = response.text().await.unwrap();
    assert!(body.contains("418"));
    assert!(serde_json::from_str::<Value>(&body).is_err());
}

#[tokio::test]
async fn network_failure_returns_500_with_error_field() {
    // Point the proxy at a port nothing listens on
    let closed_port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
        // listener dropped here
    };

    let config = Config {
        host: "127.0.0.1".to_string(),
        upstream_base_url: format!("http://127.0.0.1:{closed_port}"),
        metrics_port: 0,
        ..Config::default()
    };
    let state = AppState::new(config).unwrap();
    let addr = TestFixture::serve(build_router(state)).await;

    let client = Client::new();
    let response = client
        .get(format!("http://{addr}/cwa-proxy/data/weather"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert!(!body["error"].as_str().unwrap().is_empty());
}

// =============================================================================
// Payload Handling
// =============================================================================

#[tokio::test]
async fn invalid_json_passes_through_unchanged() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/cwa-proxy/data/notjson"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // Labeled JSON even though it isn't - documented degraded behavior
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    assert_eq!(
        response.text().await.unwrap(),
        "<!doctype html><p>maintenance window</p>"
    );
}

#[tokio::test]
async fn unfilterable_shape_passes_through_in_full() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/cwa-proxy/data/othershape?locationName=B"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["records"]["datasetDescription"], "township forecast");
}

// =============================================================================
// Location Filtering
// =============================================================================

#[tokio::test]
async fn matching_location_yields_minimized_payload() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/cwa-proxy/data/weather?locationName=B"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );

    let body: Value = response.json().await.unwrap();
    let records = body["cwaopendata"]["Dataset"]["Locations"]["Location"]
        .as_array()
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["LocationName"], "B");
    // Dataset metadata survives minimization
    assert_eq!(body["cwaopendata"]["identifier"], "F-B0053-033");
}

#[tokio::test]
async fn unknown_location_is_a_hard_404() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/cwa-proxy/data/weather?locationName=Z"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Location 'Z' not found in weather data.");
}

#[tokio::test]
async fn omitted_location_falls_back_to_the_default() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/cwa-proxy/data/weather?Authorization=CWA-KEY"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let records = body["cwaopendata"]["Dataset"]["Locations"]["Location"]
        .as_array()
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["LocationName"], "向陽山");
}

#[tokio::test]
async fn cjk_location_names_round_trip_through_the_query() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/cwa-proxy/data/weather"))
        .query(&[("locationName", "向陽山")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let records = body["cwaopendata"]["Dataset"]["Locations"]["Location"]
        .as_array()
        .unwrap();
    assert_eq!(records[0]["LocationName"], "向陽山");
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_ok_with_version() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
