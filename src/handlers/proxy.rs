//! The proxy-and-filter pipeline handler.
//!
//! Each request moves through a linear pipeline with branching at every
//! stage and no loops or retries:
//!
//! ```text
//! Start -> PathResolved | MissingRoute (400)
//! PathResolved -> Fetched | Network (500)
//! Fetched -> UpstreamOk | UpstreamStatus (relayed)
//! UpstreamOk -> Parsed | RawPassthrough (200, unparsed body)
//! Parsed -> shape found -> Matched (200, minimized) | NotFound (404)
//! Parsed -> shape absent -> Passthrough (200, full body)
//! ```
//!
//! Every terminal state emits exactly one HTTP response. The only
//! suspension point is the upstream fetch; nothing is shared between
//! invocations.

use std::time::Instant;

use axum::extract::{OriginalUri, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::config::LOCATION_PARAM;
use crate::error::{AppError, AppResult};
use crate::filter::{FilterOutcome, filter_location};
use crate::metrics;
use crate::routing::{first_value, forwarded_params, parse_query, resolve_upstream_path};
use crate::state::AppState;
use crate::validation::validate_upstream_path;

/// Proxy a GET request to the upstream open-data service and filter the
/// response down to a single location record.
///
/// Mounted as the router's GET fallback so both entry forms reach it: the
/// rewrite-style `/cwa-proxy/<resource>` path and the explicit
/// `?path=<resource>` query form.
#[instrument(skip(state, uri), fields(raw_path = %uri.path()))]
pub async fn proxy(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Response> {
    let raw_path = uri.path();
    let raw_query = uri.query().unwrap_or("");
    let pairs = parse_query(uri.query());

    // Step 1: two-tier path resolution
    let Some(path) = resolve_upstream_path(&pairs, raw_path, &state.config) else {
        metrics::record_request("missing_route");
        return Err(AppError::MissingRoute {
            path: raw_path.to_string(),
            query: raw_query.to_string(),
        });
    };

    validate_upstream_path(&path).inspect_err(|_| {
        metrics::record_request("invalid_path");
    })?;

    // Step 2: forward everything except the routing parameter
    let params = forwarded_params(&pairs);

    // The filter target is read from the same incoming parameters; the
    // parameter itself is still forwarded upstream.
    let location_name = first_value(&pairs, LOCATION_PARAM)
        .unwrap_or(&state.config.default_location)
        .to_string();

    // Step 3: single upstream attempt, redirects followed, no retry
    let started = Instant::now();
    let upstream = state.upstream.fetch(&path, &params).await.inspect_err(|_| {
        metrics::record_upstream_failure("network");
        metrics::record_request("network_error");
    })?;
    metrics::record_upstream_duration(started.elapsed().as_secs_f64());

    if !upstream.is_success() {
        metrics::record_upstream_failure("status");
        metrics::record_request("upstream_error");
        return Err(AppError::UpstreamStatus {
            status: upstream.status,
        });
    }

    // Step 4: parse failure is a passthrough, not an error. The caller may
    // receive non-JSON text labeled as JSON; documented degraded behavior.
    let payload: Value = match serde_json::from_str(&upstream.body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(
                error = %e,
                body_bytes = upstream.body.len(),
                "Upstream body is not valid JSON, passing through unparsed"
            );
            metrics::record_request("raw_passthrough");
            return json_ok(upstream.body);
        }
    };

    // Step 5: filter to the requested record
    match filter_location(&payload, &location_name) {
        FilterOutcome::Matched(minimized) => {
            let body = serde_json::to_string(&minimized)?;
            info!(
                location = %location_name,
                original_bytes = upstream.body.len(),
                minimized_bytes = body.len(),
                "Filtered upstream payload to a single location"
            );
            metrics::record_request("matched");
            json_ok(body)
        }
        FilterOutcome::NotFound => {
            metrics::record_request("not_found");
            Err(AppError::LocationNotFound(location_name))
        }
        FilterOutcome::Unfilterable => {
            // Known latent failure mode: the full payload may exceed the
            // platform's response-size limit. Flagged, not fixed.
            warn!(
                body_bytes = upstream.body.len(),
                "Upstream payload has no filterable dataset shape, returning it in full"
            );
            metrics::record_request("passthrough");
            json_ok(upstream.body)
        }
    }
}

/// Build a 200 response with the success-path headers.
///
/// `Access-Control-Allow-Origin: *` is set unconditionally here rather than
/// left to the CORS layer, which only answers requests carrying an `Origin`
/// header.
fn json_ok(body: String) -> AppResult<Response> {
    metrics::record_response_bytes(body.len());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(body.into())
        .map_err(|e| AppError::Network(format!("Failed to build response: {e}")))
}
