//! OpenAI-specific error handling.

use nps_core::Error;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) | (403, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Whether the failure is about our setup rather than this one call.
    ///
    /// Batch runs abort on these instead of counting every item as failed.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::AuthenticationError | Self::ModelNotFound)
    }
}

/// Convert an OpenAI error into the crate error type.
///
/// Credential and model problems become [`Error::Config`]; everything else is
/// a per-call [`Error::Inference`].
pub fn to_core_error(code: OpenAIErrorCode, status: u16, message: &str) -> Error {
    match code {
        OpenAIErrorCode::AuthenticationError => {
            Error::Config(format!("OpenAI authentication failed: {}", message))
        }
        OpenAIErrorCode::ModelNotFound => {
            Error::Config(format!("OpenAI model not found: {}", message))
        }
        OpenAIErrorCode::RateLimitExceeded => {
            Error::Inference(format!("Rate limit exceeded: {}", message))
        }
        OpenAIErrorCode::ContextLengthExceeded => {
            Error::Inference(format!("Context too long: {}", message))
        }
        OpenAIErrorCode::ServerError | OpenAIErrorCode::Unknown => {
            Error::Inference(format!("OpenAI returned {}: {}", status, message))
        }
    }
}
