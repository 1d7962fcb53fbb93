//! Upstream HTTP client for the CWA open-data service.
//!
//! A thin wrapper over `reqwest::Client` that composes the target URL from
//! the fixed base origin, a resolved resource path, and the reconstructed
//! query string, then issues exactly one GET per invocation.
//!
//! # Resilience Posture
//!
//! Deliberately minimal: no retry, no backoff, and no client-side timeout.
//! The hosting platform bounds wall-clock execution time, and a single
//! outbound call dominates request latency. Redirects are followed with
//! reqwest's default limit.

use axum::http::StatusCode;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// The upstream's answer: status plus body text, still unparsed.
///
/// The body is captured as text rather than JSON because a non-JSON body is
/// a passthrough case, not an error.
#[derive(Debug)]
pub struct UpstreamResponse {
    /// HTTP status returned by the upstream
    pub status: StatusCode,
    /// Raw response body text
    pub body: String,
}

impl UpstreamResponse {
    /// Whether the upstream accepted the request (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Client for the proxied open-data origin.
///
/// Cheap to clone; `reqwest::Client` holds its connection pool behind an
/// internal `Arc`.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base: Url,
}

impl UpstreamClient {
    /// Create a client for the configured upstream origin.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the base URL does not parse or
    /// the underlying client cannot be constructed.
    pub fn new(config: &Config) -> AppResult<Self> {
        let mut base = Url::parse(&config.upstream_base_url).map_err(|e| {
            AppError::ConfigError(format!(
                "Invalid upstream base URL '{}': {e}",
                config.upstream_base_url
            ))
        })?;

        // `Url::join` treats the last path segment of a slash-less base as a
        // file name and replaces it, so `http://host/api` + `x` would yield
        // `http://host/x`. Ensure the base path ends with `/` so joined
        // paths extend it instead.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base })
    }

    /// Compose the full target URL for a resolved path and forwarded params.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidPath` if the path does not join onto the
    /// base origin (validation upstream of this call makes that unlikely).
    pub fn target_url(&self, path: &str, params: &[(String, String)]) -> AppResult<Url> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| AppError::InvalidPath(format!("'{path}': {e}")))?;

        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        Ok(url)
    }

    /// Issue a single GET to the upstream, returning status and body text.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Network` for transport-level failures (DNS,
    /// connect, reset, body read). Non-success HTTP statuses are NOT errors
    /// here; the caller decides how to relay them.
    pub async fn fetch(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> AppResult<UpstreamResponse> {
        let url = self.target_url(path, params)?;
        debug!(target_url = %url, "Forwarding request upstream");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(status = %status, body_bytes = body.len(), "Upstream response received");

        Ok(UpstreamResponse { status, body })
    }
}
