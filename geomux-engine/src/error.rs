//! HTTP error mapping
//!
//! Every handler error becomes `{"error": {"code", "message"}}` with a
//! status derived from the engine or repository error kind.

use crate::types::GeocodeError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict (409), e.g. duplicate provider name
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream provider or collaborator failure (502)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Request deadline elapsed (504)
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Request cancelled, e.g. during shutdown (503)
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<GeocodeError> for ApiError {
    fn from(err: GeocodeError) -> Self {
        let message = err.to_string();
        match err {
            GeocodeError::Validation(_) => ApiError::BadRequest(message),
            GeocodeError::ProviderNotFound(_) => ApiError::NotFound(message),
            GeocodeError::Provider { .. }
            | GeocodeError::NoProvidersSucceeded(_)
            | GeocodeError::NoResultsFromProvider(_)
            | GeocodeError::Collaborator { .. } => ApiError::Upstream(message),
            GeocodeError::DeadlineExceeded(_) => ApiError::DeadlineExceeded(message),
            GeocodeError::Cancelled => ApiError::Cancelled(message),
            GeocodeError::ConfigurationMissing(_) | GeocodeError::ConfigSource(_) => {
                ApiError::Internal(message)
            }
        }
    }
}

impl From<geomux_common::Error> for ApiError {
    fn from(err: geomux_common::Error) -> Self {
        use geomux_common::Error;
        match err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::DeadlineExceeded(msg) => {
                (StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED", msg)
            }
            ApiError::Cancelled(msg) => (StatusCode::SERVICE_UNAVAILABLE, "CANCELLED", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
        };

        if status.is_server_error() {
            error!(code = error_code, "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
