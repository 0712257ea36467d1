//! Error types for nps-insights.

use thiserror::Error;

/// Result type alias using nps-insights' Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for nps-insights operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Inference/generation call failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Classifier returned output that could not be used
    #[error("Classification error: {0}")]
    Classification(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (missing credentials, bad settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means "the data could not be read".
    ///
    /// Read surfaces degrade these to an empty result instead of failing.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Serialization(_))
    }

    /// Whether this error is a per-item classifier failure.
    pub fn is_classification_failure(&self) -> bool {
        matches!(
            self,
            Error::Inference(_) | Error::Classification(_) | Error::Request(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("survey 42".to_string());
        assert_eq!(err.to_string(), "Not found: survey 42");
    }

    #[test]
    fn test_error_display_inference() {
        let err = Error::Inference("model timeout".to_string());
        assert_eq!(err.to_string(), "Inference error: model timeout");
    }

    #[test]
    fn test_error_display_classification() {
        let err = Error::Classification("no JSON array found".to_string());
        assert_eq!(err.to_string(), "Classification error: no JSON array found");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("OpenAI API key not configured".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: OpenAI API key not configured"
        );
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("file too large".to_string());
        assert_eq!(err.to_string(), "Invalid input: file too large");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.is_data_unavailable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn test_data_unavailable_classification() {
        assert!(Error::Database(sqlx::Error::RowNotFound).is_data_unavailable());
        assert!(!Error::InvalidInput("x".into()).is_data_unavailable());
        assert!(!Error::Config("x".into()).is_data_unavailable());
    }

    #[test]
    fn test_classification_failure_classes() {
        assert!(Error::Inference("x".into()).is_classification_failure());
        assert!(Error::Classification("x".into()).is_classification_failure());
        assert!(Error::Request("x".into()).is_classification_failure());
        assert!(!Error::Config("x".into()).is_classification_failure());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
