//! Prometheus metrics for application observability.
//!
//! Metrics are exposed via a dedicated HTTP listener (default port 9090,
//! disabled with `METRICS_PORT=0`).
//!
//! # Available Metrics
//!
//! ## Counters
//! - `cwa_proxy_requests_total` - Proxied requests by terminal outcome
//!   (label `outcome`: matched, not_found, passthrough, raw_passthrough,
//!   missing_route, invalid_path, upstream_error, network_error)
//! - `cwa_proxy_upstream_failures_total` - Failed upstream fetches
//!   (label `kind`: network, status)
//!
//! ## Histograms
//! - `cwa_proxy_upstream_duration_seconds` - Upstream fetch duration
//! - `cwa_proxy_response_bytes` - Size of the body returned to the caller

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const REQUESTS_TOTAL: &str = "cwa_proxy_requests_total";
    pub const UPSTREAM_FAILURES_TOTAL: &str = "cwa_proxy_upstream_failures_total";
    pub const UPSTREAM_DURATION_SECONDS: &str = "cwa_proxy_upstream_duration_seconds";
    pub const RESPONSE_BYTES: &str = "cwa_proxy_response_bytes";
}

/// Initialize the Prometheus metrics exporter.
///
/// Sets up metric descriptions and starts the Prometheus HTTP listener
/// on the specified address.
///
/// # Errors
///
/// Returns an error message if the exporter cannot be installed (e.g., the
/// listener address is already in use).
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::REQUESTS_TOTAL,
        "Total proxied requests by terminal outcome"
    );
    describe_counter!(
        names::UPSTREAM_FAILURES_TOTAL,
        "Total failed upstream fetches by failure kind"
    );
    describe_histogram!(
        names::UPSTREAM_DURATION_SECONDS,
        "Upstream fetch duration in seconds"
    );
    describe_histogram!(
        names::RESPONSE_BYTES,
        "Size in bytes of response bodies returned to callers"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
///
/// Metrics are optional; the proxy keeps serving without them.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record a proxied request reaching a terminal outcome.
pub fn record_request(outcome: &'static str) {
    counter!(names::REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record an upstream fetch failure.
pub fn record_upstream_failure(kind: &'static str) {
    counter!(names::UPSTREAM_FAILURES_TOTAL, "kind" => kind).increment(1);
}

/// Record upstream fetch duration.
pub fn record_upstream_duration(duration_secs: f64) {
    histogram!(names::UPSTREAM_DURATION_SECONDS).record(duration_secs);
}

/// Record the size of a body returned to the caller.
pub fn record_response_bytes(bytes: usize) {
    histogram!(names::RESPONSE_BYTES).record(bytes as f64);
}
