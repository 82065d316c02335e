//! Configuration types for relay core
//!
//! Core only accepts fully resolved, validated configuration.
//! All discovery and loading happens in the CLI layer.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default endpoint of the OpenAI-compatible completion API
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default bound for one tool provider round-trip, in seconds. Kept above
/// the 30 s a provider may spend on its own upstream call, so the provider's
/// error text arrives before the session gives up.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 45;

/// Model parameters for completion requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelParams {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 to 2.0)
    pub temperature: Option<f32>,
}

/// A fully resolved completion API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLlmConfig {
    /// Base URL for the API
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Model name/identifier
    pub model: String,
    /// Model parameters
    #[serde(default)]
    pub params: ModelParams,
}

impl ResolvedLlmConfig {
    /// Create a new resolved LLM config
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            base_url,
            api_key,
            model,
            params: ModelParams::default(),
        }
    }

    /// Set model parameters
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingField {
                field: "api_key".to_string(),
            }
            .into());
        }

        if self.model.is_empty() {
            return Err(ConfigError::MissingField {
                field: "model".to_string(),
            }
            .into());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "base_url".to_string(),
                value: self.base_url.clone(),
            }
            .into());
        }

        if let Some(temp) = self.params.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(ConfigError::InvalidValue {
                    field: "temperature".to_string(),
                    value: temp.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Settings for a tool provider session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound for every request/response round-trip, handshake included
    pub request_timeout: Duration,
    /// How long `close` waits for the provider to exit before killing it
    pub shutdown_grace: Duration,
    /// Name reported to the provider during the handshake
    pub client_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            shutdown_grace: Duration::from_secs(2),
            client_name: "relay".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn config() -> ResolvedLlmConfig {
        ResolvedLlmConfig::new(
            DEFAULT_BASE_URL.to_string(),
            "test-key".to_string(),
            DEFAULT_MODEL.to_string(),
        )
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let mut cfg = config();
        cfg.api_key.clear();
        assert!(matches!(
            cfg.validate(),
            Err(Error::Config(ConfigError::MissingField { .. }))
        ));
    }

    #[test]
    fn test_base_url_scheme_required() {
        let mut cfg = config();
        cfg.base_url = "api.example.com".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_temperature_range() {
        let cfg = config().with_params(ModelParams {
            max_tokens: None,
            temperature: Some(3.5),
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_session_defaults() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.request_timeout, Duration::from_secs(45));
        assert!(cfg.shutdown_grace < cfg.request_timeout);
    }
}
