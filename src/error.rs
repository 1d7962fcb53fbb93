use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error types with appropriate HTTP status codes.
///
/// # Error Taxonomy
///
/// Each variant corresponds to one failure stage of the proxy pipeline:
///
/// - `MissingRoute` - no upstream path could be resolved from the request
/// - `InvalidPath` - a path was resolved but is not safe to forward
/// - `UpstreamStatus` - the upstream service rejected the request
/// - `Network` - the upstream could not be reached at all
/// - `LocationNotFound` - a well-formed payload did not contain the record
///
/// Malformed or unexpectedly shaped upstream payloads are deliberately NOT
/// errors; they degrade to passthrough responses in the handler instead.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("No upstream path in request (path: {path}, query: {query})")]
    MissingRoute {
        /// Raw request path as received
        path: String,
        /// Raw query string as received (empty if absent)
        query: String,
    },

    #[error("Invalid upstream path: {0}")]
    InvalidPath(String),

    #[error("Upstream responded with status {status}")]
    UpstreamStatus {
        /// Upstream HTTP status code, relayed to the caller unchanged
        status: StatusCode,
    },

    #[error("Upstream fetch failed: {0}")]
    Network(String),

    #[error("Location '{0}' not found in weather data")]
    LocationNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Diagnostic body for route-resolution failures.
///
/// Includes the raw path and query so a misconfigured rewrite rule can be
/// diagnosed from the client side.
#[derive(Serialize)]
struct MissingRouteBody {
    error: &'static str,
    message: String,
    path: String,
    query: String,
}

/// Generic single-field error body (`{"error": "..."}`).
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full error server-side; the response bodies below are the
        // wire contract and stay stable regardless of internal detail.
        tracing::error!(error = %self, "Request failed");

        match self {
            AppError::MissingRoute { path, query } => {
                let body = MissingRouteBody {
                    error: "missing_route",
                    message: "No upstream path: expected a 'path' query parameter \
                              or a prefixed request path"
                        .to_string(),
                    path,
                    query,
                };
                (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
            }

            AppError::InvalidPath(reason) => (
                StatusCode::BAD_REQUEST,
                axum::Json(ErrorBody {
                    error: format!("Invalid upstream path: {reason}"),
                }),
            )
                .into_response(),

            // Relay the upstream status as-is with a plain-text body. The
            // upstream body is not parsed or forwarded on failure.
            AppError::UpstreamStatus { status } => {
                let reason = status.canonical_reason().unwrap_or("Unknown");
                let body = format!(
                    "Upstream responded with status {} {}",
                    status.as_u16(),
                    reason
                );
                (
                    status,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    body,
                )
                    .into_response()
            }

            AppError::Network(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(ErrorBody { error: message }),
            )
                .into_response(),

            AppError::LocationNotFound(name) => (
                StatusCode::NOT_FOUND,
                axum::Json(ErrorBody {
                    error: format!("Location '{name}' not found in weather data."),
                }),
            )
                .into_response(),

            AppError::Serialization(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(ErrorBody {
                    error: format!("Failed to serialize response payload: {e}"),
                }),
            )
                .into_response(),

            AppError::ConfigError(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(ErrorBody {
                    error: format!("Service configuration error: {message}"),
                }),
            )
                .into_response(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Network(e.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_route_is_400_with_debug_fields() {
        let err = AppError::MissingRoute {
            path: "/nowhere".to_string(),
            query: "a=1&b=2".to_string(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "missing_route");
        assert_eq!(body["path"], "/nowhere");
        assert_eq!(body["query"], "a=1&b=2");
    }

    #[tokio::test]
    async fn test_upstream_status_is_relayed_as_plain_text() {
        let err = AppError::UpstreamStatus {
            status: StatusCode::BAD_GATEWAY,
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("text/plain; charset=utf-8")
        );

        let body = body_string(response).await;
        assert!(body.contains("502"));
        // Plain text, not a JSON document
        assert!(serde_json::from_str::<serde_json::Value>(&body).is_err());
    }

    #[tokio::test]
    async fn test_network_error_is_500_with_error_field() {
        let err = AppError::Network("connection refused".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "connection refused");
    }

    #[tokio::test]
    async fn test_location_not_found_body_is_exact() {
        let err = AppError::LocationNotFound("玉山".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "Location '玉山' not found in weather data.");
    }
}
