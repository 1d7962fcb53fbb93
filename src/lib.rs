//! # CWA Weather Proxy
//!
//! A stateless proxy-and-filter service in front of Taiwan's CWA open-data
//! weather API, featuring:
//!
//! - **Size Reduction**: Filters multi-megabyte dataset payloads down to a
//!   single requested location record
//! - **CORS Relief**: Attaches permissive cross-origin headers so browser
//!   and mobile clients can call the open-data API indirectly
//! - **Two-Tier Routing**: Resolves the upstream resource path from a
//!   rewrite-populated query parameter or from a prefixed request path
//! - **Observability**: Request IDs, structured logging, Prometheus metrics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Request ID → Trace → CORS)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Proxy pipeline (resolve → forward → parse → filter)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  UpstreamClient (reqwest, single attempt, no retry)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  opendata.cwa.gov.tw                                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cwa_proxy::{AppState, Config, build_router};
//!
//! # async fn run() -> Result<(), cwa_proxy::AppError> {
//! let config = Config::from_env()?;
//! let state = AppState::new(config)?;
//! let app = build_router(state);
//! // Serve the router...
//! # Ok(())
//! # }
//! ```
//!
//! ## Request Forms
//!
//! Both of these reach the same pipeline:
//!
//! ```bash
//! curl 'http://localhost:3000/cwa-proxy/fileapi/v1/opendataapi/F-B0053-033?Authorization=KEY&format=JSON&locationName=向陽山'
//! curl 'http://localhost:3000/?path=fileapi/v1/opendataapi/F-B0053-033&Authorization=KEY&format=JSON'
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod routing;
pub mod state;
pub mod upstream;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use state::AppState;
pub use upstream::{UpstreamClient, UpstreamResponse};
