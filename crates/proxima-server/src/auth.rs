//! API-key gate.
//!
//! Keys are read from the `x-api-key` header. Browsers' `EventSource`
//! cannot set headers, so the `apiKey` query parameter is accepted too.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::handlers::AppState;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query parameter carrying the API key.
pub const API_KEY_PARAM: &str = "apiKey";

/// Reject requests without a configured API key.
///
/// A no-op when no keys are configured.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let keys = &state.config.auth.api_keys;
    if keys.is_empty() {
        return Ok(next.run(request).await);
    }

    let presented = header_key(request.headers())
        .or_else(|| query_key(request.uri().query()))
        .map(str::to_owned);

    match presented {
        Some(key) if keys.iter().any(|k| k == &key) => Ok(next.run(request).await),
        _ => {
            debug!(path = %request.uri().path(), "Rejected request without valid API key");
            Err(ApiError::Unauthorized)
        }
    }
}

fn header_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

fn query_key(query: Option<&str>) -> Option<&str> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == API_KEY_PARAM)
        .map(|(_, value)| value)
        .filter(|key| !key.is_empty())
}
