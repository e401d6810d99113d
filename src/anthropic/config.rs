//! Anthropic client configuration

use serde::{Deserialize, Serialize};

use crate::core::{
    config::{env_var, GenerationConfig, GenerationLimits},
    error::LlmError,
    retry::RetryPolicy,
};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Default chat model
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";

/// Value of the required `anthropic-version` header
pub const API_VERSION: &str = "2023-06-01";

/// Settings for [`AnthropicClient`](super::AnthropicClient)
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("generation", &self.generation)
            .field("retry", &self.retry)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: default_base_url(),
            generation: GenerationConfig::default(),
            retry: RetryPolicy::default(),
            timeout_secs: None,
        }
    }

    /// Load from `ANTHROPIC_API_KEY`, `ANTHROPIC_MODEL` and `ANTHROPIC_BASE_URL`
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = env_var("ANTHROPIC_API_KEY")
            .ok_or_else(|| LlmError::ConfigError("ANTHROPIC_API_KEY is not set".to_string()))?;
        let model = env_var("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut config = Self::new(api_key, model);
        if let Some(base_url) = env_var("ANTHROPIC_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::ConfigError("Anthropic API key is empty".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(LlmError::ConfigError("Anthropic model is empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(LlmError::ConfigError(format!(
                "Anthropic base URL must be http(s): {}",
                self.base_url
            )));
        }
        self.generation.validate_for(&GenerationLimits::ANTHROPIC)
    }
}
