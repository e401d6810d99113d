//! Sampling settings shared by every provider, and the limits each one enforces
//!
//! The same [`GenerationConfig`] travels inside every provider config, but the
//! APIs disagree on what they accept: OpenAI allows temperatures up to 2 and
//! has no `top_k`, Anthropic caps temperature at 1, and text-generation
//! servers reject a temperature of exactly 0. Each adapter checks its config
//! against its [`GenerationLimits`] when the client is built, so a bad value
//! fails fast instead of on the first request.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::error::LlmError;

/// Sampling parameters sent with every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Upper bound on generated tokens per reply
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Rejected by providers without top-k sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl GenerationConfig {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            temperature: None,
            top_p: None,
            top_k: None,
            stop_sequences: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
        self.stop_sequences = Some(stop_sequences);
        self
    }

    /// Check every set parameter against a provider's limits
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` naming the provider and the offending parameter.
    pub fn validate_for(&self, limits: &GenerationLimits) -> Result<(), LlmError> {
        let reject = |reason: String| -> Result<(), LlmError> {
            Err(LlmError::ConfigError(format!("{}: {}", limits.provider, reason)))
        };

        if self.max_tokens == 0 {
            return reject("max_tokens must be positive".to_string());
        }
        if let Some(temperature) = self.temperature {
            if !limits.temperature.contains(&temperature) {
                return reject(format!(
                    "temperature {} is outside {:?}",
                    temperature, limits.temperature
                ));
            }
        }
        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return reject(format!("top_p {} is outside 0..=1", top_p));
            }
        }
        match self.top_k {
            Some(_) if !limits.top_k => return reject("top_k is not supported".to_string()),
            Some(0) => return reject("top_k must be positive".to_string()),
            _ => {}
        }
        if let (Some(max), Some(stops)) = (limits.max_stop_sequences, &self.stop_sequences) {
            if stops.len() > max {
                return reject(format!(
                    "at most {} stop sequences are accepted, got {}",
                    max,
                    stops.len()
                ));
            }
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// What one provider accepts in a [`GenerationConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationLimits {
    /// Provider name used in error messages
    pub provider: &'static str,
    pub temperature: RangeInclusive<f32>,
    /// Whether `top_k` may be set at all
    pub top_k: bool,
    pub max_stop_sequences: Option<usize>,
}

impl GenerationLimits {
    pub const OPENAI: GenerationLimits = GenerationLimits {
        provider: "OpenAI",
        temperature: 0.0..=2.0,
        top_k: false,
        max_stop_sequences: Some(4),
    };

    pub const ANTHROPIC: GenerationLimits = GenerationLimits {
        provider: "Anthropic",
        temperature: 0.0..=1.0,
        top_k: true,
        max_stop_sequences: None,
    };

    /// Text-generation servers need a strictly positive temperature
    pub const HUGGINGFACE: GenerationLimits = GenerationLimits {
        provider: "HuggingFace",
        temperature: f32::MIN_POSITIVE..=100.0,
        top_k: true,
        max_stop_sequences: None,
    };
}

/// Read an environment variable, treating blank values as unset
pub(crate) fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
