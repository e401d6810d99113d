//! Error types for the provider layer

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when using LLM providers
#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing or rejected credentials
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP request failures
    #[error("HTTP error (status {status}): {body}")]
    HttpError { status: u16, body: String },

    /// JSON encoding/decoding issues
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded (retry after {retry_after:?})")]
    RateLimitExceeded { retry_after: Option<Duration> },

    /// Provider temporarily unable to serve the request
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Provider-specific errors
    #[error("Provider error ({code}): {message}")]
    ProviderError { code: String, message: String },

    /// The reply ended for a reason this layer cannot interpret
    #[error("Responses with finish reason `{finish_reason}` cannot be parsed")]
    UnrecognizedResponseKind { finish_reason: String },

    /// Transient failures persisted past the retry budget
    #[error("Giving up after {attempts} attempts: {last_error}")]
    RetryExhausted {
        attempts: u32,
        last_error: Box<LlmError>,
    },
}

impl LlmError {
    /// Whether the failure is worth retrying after a delay
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimitExceeded { .. } | LlmError::ServiceUnavailable(_)
        )
    }

    /// Server-suggested delay before retrying, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimitExceeded { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            return LlmError::ServiceUnavailable(err.to_string());
        }
        if err.is_decode() {
            return LlmError::SerializationError(err.to_string());
        }
        LlmError::HttpError {
            status: err.status().map(|status| status.as_u16()).unwrap_or(0),
            body: err.to_string(),
        }
    }
}
