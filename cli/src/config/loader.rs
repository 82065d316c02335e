//! Completion API configuration for the relay CLI
//!
//! Resolution order, per field:
//! 1. Command-line flag
//! 2. Environment variable (`.env` in the working directory is loaded first)
//! 3. Built-in default (base URL and model only; the API key has none)

use anyhow::{anyhow, Context, Result};
use relay_core::config::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use relay_core::{ModelParams, ResolvedLlmConfig};
use tracing::debug;

/// Environment variable holding the completion API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable holding the completion API base URL
pub const BASE_URL_ENV: &str = "BASE_URL";
/// Environment variable holding the model id
pub const MODEL_ENV: &str = "MODEL";

/// CLI configuration loader
#[derive(Debug, Default)]
pub struct CliConfigLoader {
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
    params: ModelParams,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set API key override
    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.api_key_override = Some(api_key);
        self
    }

    /// Set base URL override
    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Set sampling parameters
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    /// Resolve against the process environment
    pub fn load(&self) -> Result<ResolvedLlmConfig> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve with an explicit variable lookup. Empty values count as unset.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<ResolvedLlmConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = self
            .api_key_override
            .clone()
            .or_else(|| lookup(API_KEY_ENV))
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured. Set {} (environment or .env file) or pass --api-key",
                    API_KEY_ENV
                )
            })?;

        let base_url = self
            .base_url_override
            .clone()
            .or_else(|| lookup(BASE_URL_ENV))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = self
            .model_override
            .clone()
            .or_else(|| lookup(MODEL_ENV))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let config = ResolvedLlmConfig::new(base_url, api_key, model).with_params(self.params.clone());
        config
            .validate()
            .context("Invalid completion API configuration")?;

        debug!(base_url = %config.base_url, model = %config.model, "resolved completion API config");
        Ok(config)
    }
}
