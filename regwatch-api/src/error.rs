//! HTTP error type for regwatch-api
//!
//! Every failure reaches the client as `{"error": {"code", "message"}}`.
//! Database and internal details stay in the log.

use crate::agents::AgentError;
use crate::services::ServiceError;
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
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// LLM or scraped site failed (502)
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Feature switched off by configuration (503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500); the message is logged, not returned
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<regwatch_common::Error> for ApiError {
    fn from(err: regwatch_common::Error) -> Self {
        use regwatch_common::Error;

        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Common(err) => err.into(),
            ServiceError::Agent(err @ (AgentError::Template { .. } | AgentError::Vocabulary(_))) => {
                ApiError::Internal(err.to_string())
            }
            ServiceError::Agent(err) => ApiError::Upstream(err.to_string()),
            ServiceError::Fetch(err) => ApiError::Upstream(err.to_string()),
            ServiceError::LlmUnavailable(what) => {
                ApiError::ServiceUnavailable(format!("{} requires an LLM API key", what))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
            }
            ApiError::Internal(msg) => {
                error!("Request failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

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
