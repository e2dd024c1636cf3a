//! Common configuration structures for LLM providers.

use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_retries() -> u32 {
    3
}

/// Configuration for remote LLM providers (OpenAI-compatible APIs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLlmConfig {
    /// API key for authentication.
    pub api_key: String,

    /// Base URL for the API.
    ///
    /// Examples:
    /// - OpenAI: "https://api.openai.com/v1"
    /// - OpenRouter: "https://openrouter.ai/api/v1"
    pub base_url: String,

    /// Model name/identifier.
    pub model: String,

    /// Request timeout duration (per attempt).
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Maximum attempts for failed requests.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl RemoteLlmConfig {
    /// Create a new remote LLM configuration.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
        }
    }

    /// Build a configuration reading the API key from the environment.
    ///
    /// # Arguments
    /// * `key_var` - Environment variable holding the API key
    /// * `base_url` - API base URL
    /// * `model` - Model identifier
    pub fn from_env(
        key_var: &str,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let api_key =
            std::env::var(key_var).map_err(|_| LlmError::ApiKeyNotFound(key_var.to_string()))?;
        Ok(Self::new(api_key, base_url, model))
    }

    /// Set the per-attempt request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RemoteLlmConfig::new("key", "https://api.openai.com/v1", "gpt-4o-mini");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_from_env_missing_key() {
        let err = RemoteLlmConfig::from_env("MOVI_TEST_NO_SUCH_KEY", "url", "model").unwrap_err();
        assert!(matches!(err, LlmError::ApiKeyNotFound(_)));
    }
}
