//! Anthropic-specific request and response types
//!
//! These types map directly to the messages API schema.

use serde::{Deserialize, Serialize};

/// Request body for `POST /messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequest {
    pub model: String,
    /// Maximum number of tokens to generate (required)
    pub max_tokens: u32,
    /// Alternating user / assistant turns, already in wire shape
    pub messages: Vec<serde_json::Value>,
    /// System prompt (top-level field, never a message)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<AnthropicTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

/// Tool definition for Anthropic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicTool {
    pub name: String,
    pub description: String,
    /// Input schema (JSON Schema)
    pub input_schema: serde_json::Value,
}

/// A content block within a reply
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// The model invoking a tool
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Thinking and other block kinds this layer does not surface
    #[serde(other)]
    Other,
}

/// Response body of a non-streaming message
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// `end_turn`, `max_tokens`, `stop_sequence`, `tool_use`, ...
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<AnthropicUsage>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AnthropicUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

/// Error envelope returned with non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicErrorResponse {
    pub error: AnthropicErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicErrorBody {
    /// e.g. `invalid_request_error`, `overloaded_error`
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}
