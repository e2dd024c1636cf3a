//! Tooling utilities and helpers for the movi workspace
//!
//! This crate provides common tooling functionality used across the
//! movi workspace.
//!
//! # Modules
//!
//! - `async_utils` - Retry policies and timeout utilities for async operations
//! - `logging` - Structured logging setup and helpers
//! - `validation` - Fluent validation API used by wizard step validators

pub mod async_utils;
pub mod logging;
pub mod validation;

use thiserror::Error;

/// Errors that can occur in the tooling crate
#[derive(Debug, Error)]
pub enum ToolingError {
    /// General error with message
    #[error("Tooling error: {0}")]
    General(String),

    /// A value failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for tooling operations
pub type Result<T> = std::result::Result<T, ToolingError>;

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let v = version();
        assert!(!v.is_empty());
    }
}
