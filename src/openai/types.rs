//! OpenAI-specific request and response types
//!
//! These types map directly to the chat completions API schema.

use serde::{Deserialize, Serialize};

/// Request body for `POST /chat/completions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model identifier, e.g. `gpt-3.5-turbo`
    pub model: String,
    /// Conversation turns, already in wire shape
    pub messages: Vec<serde_json::Value>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Tools the model may call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OpenAiTool>>,
    /// Only sent together with `tools`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    /// Legacy function declarations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionDefinition>>,
}

/// Tool definition for OpenAI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiTool {
    /// Always "function"
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

/// Function schema advertised to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the argument object
    pub parameters: serde_json::Value,
}

/// Response body of a non-streaming chat completion
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

/// One candidate reply
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    /// Null on some older vision models, which report `finish_details` instead
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub finish_details: Option<FinishDetails>,
}

/// Terminal condition reported by models without `finish_reason`
#[derive(Debug, Clone, Deserialize)]
pub struct FinishDetails {
    #[serde(rename = "type")]
    pub finish_type: String,
}

/// Assistant message inside a choice
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ResponseToolCall>>,
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
}

/// Tool call issued by the model
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseToolCall {
    pub id: String,
    #[serde(rename = "type", default)]
    pub call_type: Option<String>,
    pub function: FunctionCall,
}

/// Function name with JSON-encoded arguments
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// Token usage information
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OpenAiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Error envelope returned with non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiErrorResponse {
    pub error: OpenAiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiErrorBody {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// String on most errors, occasionally absent or numeric
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

impl OpenAiErrorBody {
    /// Most specific error identifier available
    pub fn code_str(&self) -> String {
        match &self.code {
            Some(serde_json::Value::String(code)) => code.clone(),
            Some(serde_json::Value::Null) | None => {
                self.error_type.clone().unwrap_or_else(|| "unknown".to_string())
            }
            Some(other) => other.to_string(),
        }
    }
}
