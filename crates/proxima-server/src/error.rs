//! API error type.
//!
//! Every handler returns [`ApiError`] on failure; it renders as
//! `{"error": "<message>"}` with the matching status code.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use proxima_core::{PublishError, RegistryError};
use proxima_geo::GeoError;
use serde_json::json;
use thiserror::Error;

use crate::consent::ConsentError;
use crate::metrics;

/// Unified error type for HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body or parameters are invalid.
    #[error("{0}")]
    InvalidInput(String),

    /// Missing or unknown API key.
    #[error("Missing or invalid API key")]
    Unauthorized,

    /// Resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request conflicts with the resource state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Service is shutting down.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::Unauthorized => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Unavailable(_) => "unavailable",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        metrics::record_error(self.kind());

        let body = json!({
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<PublishError> for ApiError {
    fn from(err: PublishError) -> Self {
        if err.is_invalid_input() {
            ApiError::InvalidInput(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::InvalidChannel(_) => ApiError::InvalidInput(err.to_string()),
            RegistryError::Closed => ApiError::Unavailable(err.to_string()),
            RegistryError::Encode(_) | RegistryError::Push(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<GeoError> for ApiError {
    fn from(err: GeoError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<ConsentError> for ApiError {
    fn from(err: ConsentError) -> Self {
        match err {
            ConsentError::MissingField(_) => ApiError::InvalidInput(err.to_string()),
            ConsentError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ConsentError::AlreadyRevoked(_) => ApiError::Conflict(err.to_string()),
        }
    }
}
