//! Error types for the server.
//!
//! Every failure reaching a client is reported as `500 Internal Server Error`,
//! including upstream statuses such as 401 or 404. The upstream status and
//! body travel in the JSON error body instead.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use driveline_drive::UpstreamError;
use driveline_oauth::OAuthError;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The authorization code could not be redeemed.
    #[error("Authorization failed: {0}")]
    AuthExchange(#[from] OAuthError),

    /// The provider redirected back with an error instead of a code.
    #[error("Authorization denied: {error}: {description}")]
    AuthDenied { error: String, description: String },

    /// The resource API call failed.
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session middleware failure.
    #[error("Session error: {0}")]
    Session(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Status returned by the provider or resource API, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
    /// Body returned by the provider or resource API, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_body: Option<serde_json::Value>,
}

impl ServerError {
    fn code(&self) -> &'static str {
        match self {
            ServerError::AuthExchange(_) | ServerError::AuthDenied { .. } => "auth_exchange_error",
            ServerError::Upstream(_) => "upstream_error",
            ServerError::Config(_) => "config_error",
            ServerError::Session(_) => "session_error",
            ServerError::Internal(_) => "internal_error",
        }
    }

    fn upstream(&self) -> (Option<u16>, Option<serde_json::Value>) {
        match self {
            ServerError::AuthExchange(e) => (e.status(), e.body().map(raw_body)),
            ServerError::AuthDenied { error, description } => (
                None,
                Some(serde_json::json!({
                    "error": error,
                    "error_description": description,
                })),
            ),
            ServerError::Upstream(e) => (e.status(), e.body().map(raw_body)),
            ServerError::Config(_) | ServerError::Session(_) | ServerError::Internal(_) => {
                (None, None)
            }
        }
    }
}

/// Embed an upstream body as JSON when it is JSON, as a string otherwise.
fn raw_body(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let code = self.code();
        let message = self.to_string();
        let (upstream_status, upstream_body) = self.upstream();

        tracing::error!(status = %status, code, ?upstream_status, error = %message, "Request failed");

        let body = ErrorResponse {
            code: code.to_string(),
            message,
            upstream_status,
            upstream_body,
        };

        (status, Json(body)).into_response()
    }
}
