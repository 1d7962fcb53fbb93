//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible defaults
//! for development. In production, configure via environment variables or a `.env` file.
//!
//! # Proxy Configuration
//!
//! - `UPSTREAM_BASE_URL`: Origin of the proxied open-data API
//!   (default: `https://opendata.cwa.gov.tw`)
//! - `ROUTE_PREFIX`: Path prefix stripped to recover the upstream resource
//!   path when the `path` query parameter is absent (default: `/cwa-proxy/`)
//! - `DEFAULT_LOCATION`: Location record used for filtering when the client
//!   omits `locationName` (default: `向陽山`)

use std::env;

use url::Url;

use crate::error::{AppError, AppResult};

/// Query parameter carrying the upstream resource path.
///
/// Populated by the hosting platform's rewrite rule
/// (`/cwa-proxy/* -> ?path=:splat`). Consumed here, never forwarded.
pub const PATH_PARAM: &str = "path";

/// Query parameter naming the location record to filter for.
///
/// Consumed locally for filtering and still forwarded upstream; only the
/// routing parameter is excluded from the forwarded query string.
pub const LOCATION_PARAM: &str = "locationName";

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Base origin of the upstream open-data service
    pub upstream_base_url: String,

    /// Path prefix stripped from the raw request path to recover the
    /// upstream resource path (second-tier route resolution)
    pub route_prefix: String,

    /// Fallback location name when the client omits `locationName`
    pub default_location: String,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Comma-separated list of allowed CORS origins
    /// Use "*" to allow all origins (the proxy exists to lift CORS
    /// restrictions for browser clients, so "*" is the expected value)
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any required configuration is invalid
    /// (e.g., non-numeric PORT value, unparseable UPSTREAM_BASE_URL).
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 3000)?,

            // Upstream
            upstream_base_url: env::var("UPSTREAM_BASE_URL")
                .unwrap_or_else(|_| "https://opendata.cwa.gov.tw".to_string()),
            route_prefix: env::var("ROUTE_PREFIX").unwrap_or_else(|_| "/cwa-proxy/".to_string()),
            default_location: env::var("DEFAULT_LOCATION").unwrap_or_else(|_| "向陽山".to_string()),

            // Security
            cors_allowed_origins: Self::parse_cors_origins(),

            // Observability
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        // Upstream base must be an absolute http(s) URL
        let base = Url::parse(&self.upstream_base_url).map_err(|e| {
            AppError::ConfigError(format!(
                "Invalid UPSTREAM_BASE_URL '{}': {e}",
                self.upstream_base_url
            ))
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::ConfigError(format!(
                "UPSTREAM_BASE_URL must use http or https, got '{}'",
                base.scheme()
            )));
        }

        // The prefix must delimit a path segment on both sides, otherwise
        // stripping it produces garbage paths
        if !self.route_prefix.starts_with('/') || !self.route_prefix.ends_with('/') {
            return Err(AppError::ConfigError(format!(
                "ROUTE_PREFIX must start and end with '/', got '{}'",
                self.route_prefix
            )));
        }

        if self.default_location.is_empty() {
            return Err(AppError::ConfigError(
                "DEFAULT_LOCATION must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr + ToString,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse CORS allowed origins from environment variable.
    fn parse_cors_origins() -> Vec<String> {
        env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 3000,
            // Upstream
            upstream_base_url: "https://opendata.cwa.gov.tw".to_string(),
            route_prefix: "/cwa-proxy/".to_string(),
            default_location: "向陽山".to_string(),
            // Security
            cors_allowed_origins: vec!["*".to_string()],
            // Observability
            log_level: "info".to_string(),
            metrics_port: 9090,
        }
    }
}
