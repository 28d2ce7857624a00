//! Error types for the relay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors that can occur while relaying a request.
///
/// Upstream replies with error statuses are not errors here: they are
/// forwarded to the caller as-is.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The upstream API could not be reached or the transfer failed.
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// A mutating request carried a body that is not JSON.
    #[error("Invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            RelayError::Upstream(err) => {
                tracing::error!(error = %err, "Upstream request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to reach upstream API",
                    err.to_string(),
                )
            }
            RelayError::InvalidBody(err) => {
                tracing::warn!(error = %err, "Rejected request body");
                (StatusCode::BAD_REQUEST, "Invalid JSON body", err.to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
            "details": details,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
