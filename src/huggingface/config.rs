//! HuggingFace client configuration

use serde::{Deserialize, Serialize};

use crate::core::{
    config::{env_var, GenerationConfig, GenerationLimits},
    error::LlmError,
    retry::RetryPolicy,
};

use super::template::ChatTemplate;

/// Default Inference API root; the model id is appended
pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/models";

/// Default chat model
pub const DEFAULT_MODEL: &str = "HuggingFaceH4/zephyr-7b-beta";

/// Settings for [`HuggingFaceClient`](super::HuggingFaceClient)
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    pub api_key: String,
    /// Model id, e.g. `meta-llama/Llama-2-7b-chat-hf`
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Guessed from the model id when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_template: Option<ChatTemplate>,
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

impl std::fmt::Debug for HuggingFaceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("chat_template", &self.chat_template)
            .field("generation", &self.generation)
            .field("retry", &self.retry)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl HuggingFaceConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: default_base_url(),
            chat_template: None,
            generation: GenerationConfig::default(),
            retry: RetryPolicy::default(),
            timeout_secs: None,
        }
    }

    /// Load from `HF_API_KEY`, `HF_MODEL` and `HF_BASE_URL`
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = env_var("HF_API_KEY")
            .ok_or_else(|| LlmError::ConfigError("HF_API_KEY is not set".to_string()))?;
        let model = env_var("HF_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut config = Self::new(api_key, model);
        if let Some(base_url) = env_var("HF_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_chat_template(mut self, template: ChatTemplate) -> Self {
        self.chat_template = Some(template);
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

    /// Configured template, or the one matching the model id
    pub fn template(&self) -> ChatTemplate {
        self.chat_template
            .unwrap_or_else(|| ChatTemplate::for_model(&self.model))
    }

    pub(crate) fn validate(&self) -> Result<(), LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::ConfigError("HuggingFace API key is empty".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(LlmError::ConfigError("HuggingFace model is empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(LlmError::ConfigError(format!(
                "HuggingFace base URL must be http(s): {}",
                self.base_url
            )));
        }
        self.generation.validate_for(&GenerationLimits::HUGGINGFACE)
    }
}
