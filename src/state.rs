//! Shared application state for Axum handlers.
//!
//! The proxy is stateless by design: each invocation is isolated, nothing
//! persists across requests, and no background tasks run. The state carries
//! only the pieces every handler needs - the upstream client (an internally
//! pooled `reqwest::Client`), the configuration, and the start instant for
//! uptime reporting.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::AppResult;
use crate::upstream::UpstreamClient;

/// Shared application state, cloned per request handler.
#[derive(Clone)]
pub struct AppState {
    /// Client for the proxied upstream origin
    pub upstream: UpstreamClient,
    /// Application configuration
    pub config: Arc<Config>,
    /// Timestamp when the application started
    pub started_at: Instant,
}

impl AppState {
    /// Build application state from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the upstream client cannot be
    /// constructed from the configured base URL.
    pub fn new(config: Config) -> AppResult<Self> {
        let upstream = UpstreamClient::new(&config)?;

        Ok(Self {
            upstream,
            config: Arc::new(config),
            started_at: Instant::now(),
        })
    }

    /// Get application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
