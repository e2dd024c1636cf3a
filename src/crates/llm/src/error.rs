//! Error types for LLM provider implementations.

use thiserror::Error;

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when working with LLM providers.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API key not found in environment.
    #[error("API key not found: {0}")]
    ApiKeyNotFound(String),

    /// Provider returned a non-success status.
    #[error("Provider returned {status}: {body}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// Invalid response from provider.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request timeout.
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// All retry attempts exhausted.
    #[error("All {attempts} attempts failed; last error: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: usize,
        /// Message from the final attempt
        last_error: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Whether this error is a timeout (terminal timeouts route the
    /// intent parser to its regex fallback strategy).
    pub fn is_timeout(&self) -> bool {
        match self {
            LlmError::Timeout(_) => true,
            LlmError::RetriesExhausted { last_error, .. } => last_error.contains("timed out"),
            _ => false,
        }
    }
}
