//! Health and readiness endpoints.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check with version and uptime
//! - `GET /ready` - Kubernetes-compatible readiness probe
//!
//! The proxy holds no connections and no state, so health is a liveness
//! statement: if the process answers, it is healthy. Upstream reachability
//! is deliberately not probed here - every proxied request already reports
//! upstream failures precisely, and a health probe hammering the upstream
//! would waste its rate budget.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service health status
    pub status: String,
    /// Service version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check endpoint.
///
/// Always returns 200 OK with version and uptime details.
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
    })
}

/// Readiness check endpoint for Kubernetes probes.
///
/// The service is ready as soon as it is serving; there is no connection
/// warm-up or state to wait for.
#[instrument]
pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
