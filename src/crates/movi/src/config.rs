//! Configuration management
//!
//! Loads a TOML file when `MOVI_CONFIG` points at one, then applies
//! environment-variable overrides. Every field has a default so the
//! server boots with no configuration at all.

use serde::{Deserialize, Serialize};

use crate::context::DEFAULT_HISTORY_LIMIT;
use crate::error::{AgentError, ErrorKind, Result};

/// LLM provider section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// OpenAI-compatible base URL
    pub base_url: String,
    /// Model identifier
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite connection string
    pub database_url: String,
    /// HTTP bind address
    pub bind_addr: String,
    /// Conversation turns kept per parse
    pub history_limit: usize,
    /// Populate an empty database with demo fixtures
    pub seed_demo_data: bool,
    /// LLM provider settings
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:movi.db".to_string(),
            bind_addr: "127.0.0.1:8090".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            seed_demo_data: false,
            llm: LlmConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then file, then environment
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("MOVI_CONFIG") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|e| {
                    AgentError::domain(
                        ErrorKind::Internal,
                        format!("cannot read config file '{}': {}", path, e),
                    )
                })?;
                toml::from_str(&raw).map_err(|e| {
                    AgentError::domain(
                        ErrorKind::Internal,
                        format!("cannot parse config file '{}': {}", path, e),
                    )
                })?
            }
            Err(_) => Self::default(),
        };

        if let Ok(url) = std::env::var("MOVI_DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(addr) = std::env::var("MOVI_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(flag) = std::env::var("MOVI_SEED_DEMO_DATA") {
            config.seed_demo_data = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        if let Ok(model) = std::env::var("MOVI_LLM_MODEL") {
            config.llm.model = model;
        }
        if let Ok(base_url) = std::env::var("MOVI_LLM_BASE_URL") {
            config.llm.base_url = base_url;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert!(config.database_url.starts_with("sqlite:"));
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let raw = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.bind_addr, config.bind_addr);
        assert_eq!(parsed.llm.model, config.llm.model);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: AppConfig = toml::from_str(r#"bind_addr = "0.0.0.0:9000""#).unwrap();
        assert_eq!(parsed.bind_addr, "0.0.0.0:9000");
        assert_eq!(parsed.history_limit, DEFAULT_HISTORY_LIMIT);
    }
}
