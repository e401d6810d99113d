//! HuggingFace Inference API request and response types

use serde::{Deserialize, Serialize};

/// Text-generation request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextGenerationRequest {
    /// Templated prompt
    pub inputs: String,
    pub parameters: GenerationParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub max_new_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub stop: Vec<String>,
    /// Only the continuation is returned when false
    pub return_full_text: bool,
    /// Ask for `details.finish_reason`
    pub details: bool,
}

/// The API answers with a list, some deployments with a bare object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextGenerationResponse {
    Many(Vec<GeneratedText>),
    One(GeneratedText),
}

impl TextGenerationResponse {
    /// First generation, if any
    pub fn into_first(self) -> Option<GeneratedText> {
        match self {
            TextGenerationResponse::Many(items) => items.into_iter().next(),
            TextGenerationResponse::One(item) => Some(item),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedText {
    pub generated_text: String,
    #[serde(default)]
    pub details: Option<GenerationDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationDetails {
    /// `eos_token`, `stop_sequence` or `length`
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub generated_tokens: Option<u32>,
}

/// Error body, e.g. `{"error": "Model is currently loading", "estimated_time": 20.0}`
#[derive(Debug, Clone, Deserialize)]
pub struct HfErrorResponse {
    pub error: String,
    #[serde(default)]
    pub estimated_time: Option<f64>,
}
