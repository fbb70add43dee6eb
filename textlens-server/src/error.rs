//! Error types for the textlens HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use textlens_core::AdmissionError;
use tracing::error;

use crate::llm::LlmError;
use crate::store::StoreError;

/// Errors surfaced to HTTP clients
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request failed validation
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// Request or one of its fields is too large
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Admission queue is full
    #[error("Server at capacity, try again later")]
    AtCapacity,

    /// Service is shutting down or otherwise not accepting work
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// LLM backend failed
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Persistence failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AdmissionError> for ApiError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::CapacityExceeded { .. } => ApiError::AtCapacity,
            AdmissionError::Closed => ApiError::ServiceUnavailable(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::AtCapacity | ApiError::ServiceUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Llm(LlmError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Llm(LlmError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Llm(LlmError::MalformedResponse(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error type
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_request",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::AtCapacity => "at_capacity",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Llm(LlmError::Timeout(_)) => "llm_timeout",
            ApiError::Llm(LlmError::Unavailable(_)) => "llm_unavailable",
            ApiError::Llm(LlmError::MalformedResponse(_)) => "llm_malformed_response",
            ApiError::Store(_) => "storage_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && !matches!(self, ApiError::AtCapacity) {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": self.code(),
            }
        }));

        (status, body).into_response()
    }
}
