//! HTTP error mapping.
//!
//! Every failure leaves the API as `{"error": "..."}` with a 4xx/5xx status.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

/// Message for LLM-backed endpoints when no backend is configured.
pub const NOT_CONFIGURED: &str = "OpenAI API key not configured";

/// Message for requests rejected by a body size limit.
pub const PAYLOAD_TOO_LARGE: &str = "Request body too large";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    /// Missing or rejected credentials for an external service.
    #[error("{0}")]
    NotConfigured(String),
    #[error(transparent)]
    Internal(nps_core::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_configured() -> Self {
        Self::NotConfigured(NOT_CONFIGURED.to_string())
    }

    pub fn payload_too_large() -> Self {
        Self::PayloadTooLarge(PAYLOAD_TOO_LARGE.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotConfigured(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<nps_core::Error> for ApiError {
    fn from(err: nps_core::Error) -> Self {
        match err {
            nps_core::Error::NotFound(msg) => Self::NotFound(msg),
            nps_core::Error::InvalidInput(msg) => Self::BadRequest(msg),
            nps_core::Error::Config(msg) => {
                warn!(subsystem = "api", error = %msg, "External service not configured");
                Self::not_configured()
            }
            other => Self::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match self {
            Self::Internal(err) => {
                error!(subsystem = "api", error = %err, "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Replace the plain-text 413 produced by body limit layers and extractors
/// with the JSON error shape.
pub async fn json_payload_too_large(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE || is_json {
        return response;
    }
    warn!(subsystem = "api", "Request body exceeded limit");
    ApiError::payload_too_large().into_response()
}

/// Degrade a data-unavailable failure to the empty value of `T`.
///
/// Read endpoints answer "no data" with 200 rather than an error banner;
/// other failures still propagate.
pub fn or_empty<T: Default>(result: nps_core::Result<T>, op: &'static str) -> Result<T, ApiError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.is_data_unavailable() => {
            warn!(
                subsystem = "api",
                op,
                error = %err,
                "Data unavailable, returning empty result"
            );
            Ok(T::default())
        }
        Err(err) => Err(err.into()),
    }
}
