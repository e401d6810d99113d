//! Mapping between wrapper types and Anthropic messages types

use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::{
    config::GenerationConfig,
    error::LlmError,
    format::{PromptFormatter, ProviderPayload},
    types::{FinishReason, Message, ProviderReply, ResponseTurn, Role, ToolCall, ToolResponse, UsageMetadata},
};
use crate::tools::ToolDeclaration;

use super::types::{AnthropicErrorResponse, AnthropicTool, ContentBlock, MessagesRequest, MessagesResponse};

/// Messages with `tool_use` / `tool_result` content blocks
///
/// The system prompt is kept as a `system` turn here and lifted into the
/// request's top-level field by [`to_anthropic_request`]. Tool results go in
/// user turns.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicFormatter;

impl PromptFormatter for AnthropicFormatter {
    fn format_message(&self, message: &Message) -> Value {
        json!({"role": message.role.as_str(), "content": message.text})
    }

    fn format_tool_call(&self, call: &ToolCall) -> Value {
        // `input` must be an object; blank or malformed arguments become `{}`
        let input = serde_json::from_str::<Value>(&call.arguments)
            .ok()
            .filter(Value::is_object)
            .unwrap_or_else(|| json!({}));
        json!({
            "role": call.role().as_str(),
            "content": [{
                "type": "tool_use",
                "id": call.call_id,
                "name": call.tool_name,
                "input": input,
            }],
        })
    }

    fn format_tool_response(&self, response: &ToolResponse) -> Value {
        json!({
            "role": Role::User.as_str(),
            "content": [{
                "type": "tool_result",
                "tool_use_id": response.call_id,
                "content": response.result,
            }],
        })
    }
}

fn to_anthropic_tool(tool: &ToolDeclaration) -> AnthropicTool {
    AnthropicTool {
        name: tool.name.clone(),
        description: tool.description.clone(),
        input_schema: tool.parameters.clone(),
    }
}

/// Build the request body for one payload
pub fn to_anthropic_request(
    model: &str,
    payload: &ProviderPayload,
    generation: &GenerationConfig,
    tools: &[ToolDeclaration],
) -> MessagesRequest {
    let mut system = Vec::new();
    let mut messages = Vec::with_capacity(payload.len());
    for message in &payload.messages {
        if message["role"] == Role::System.as_str() {
            if let Some(text) = message["content"].as_str().filter(|text| !text.is_empty()) {
                system.push(text);
            }
        } else {
            messages.push(message.clone());
        }
    }

    MessagesRequest {
        model: model.to_string(),
        max_tokens: generation.max_tokens,
        messages,
        system: (!system.is_empty()).then(|| system.join("\n\n")),
        tools: (!tools.is_empty()).then(|| tools.iter().map(to_anthropic_tool).collect()),
        temperature: generation.temperature,
        top_p: generation.top_p,
        top_k: generation.top_k,
        stop_sequences: generation.stop_sequences.clone(),
    }
}

/// Parse a message into a typed reply
pub fn from_anthropic_response(response: MessagesResponse) -> Result<ProviderReply, LlmError> {
    let usage = response
        .usage
        .map(|u| UsageMetadata::new(u.input_tokens, u.output_tokens));
    let stop_reason = response.stop_reason.unwrap_or_else(|| "null".to_string());

    let reply = match stop_reason.as_str() {
        "end_turn" | "stop_sequence" => {
            let ignored = tool_names(&response.content);
            if !ignored.is_empty() {
                warn!(?ignored, "Stop reply also carried tool_use blocks; they are not dispatched");
            }
            text_reply(&response.content, FinishReason::Stop)
        }
        "max_tokens" => {
            warn!("Anthropic reply hit the token limit; content may be incomplete");
            text_reply(&response.content, FinishReason::Length)
        }
        "tool_use" => tool_use_reply(response.content)?,
        _ => return Err(LlmError::UnrecognizedResponseKind { finish_reason: stop_reason }),
    };

    Ok(match usage {
        Some(usage) => reply.with_usage(usage),
        None => reply,
    })
}

fn tool_names(content: &[ContentBlock]) -> Vec<&str> {
    content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolUse { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect()
}

fn joined_text(content: &[ContentBlock]) -> String {
    content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn text_reply(content: &[ContentBlock], finish_reason: FinishReason) -> ProviderReply {
    ProviderReply {
        turn: ResponseTurn::Message(Message::assistant(joined_text(content))),
        finish_reason,
        usage: None,
    }
}

fn tool_use_reply(content: Vec<ContentBlock>) -> Result<ProviderReply, LlmError> {
    let preamble = joined_text(&content);
    if !preamble.is_empty() {
        debug!(%preamble, "Dropping text that accompanied a tool call");
    }

    let mut calls = content.into_iter().filter_map(|block| match block {
        ContentBlock::ToolUse { id, name, input } => Some(ToolCall::new(name, id, input.to_string())),
        _ => None,
    });

    let first = calls.next().ok_or_else(|| LlmError::ProviderError {
        code: "missing_tool_call".to_string(),
        message: "Stop reason requested a tool call but no tool_use block was included".to_string(),
    })?;

    let dropped: Vec<String> = calls.map(|call| call.tool_name).collect();
    if !dropped.is_empty() {
        warn!(?dropped, "Model issued several tool calls; only the first is answered");
    }

    Ok(ProviderReply::tool_call(first))
}

/// Map a non-success status and its body to an error
pub fn map_error_status(status: StatusCode, retry_after: Option<Duration>, body: String) -> LlmError {
    let parsed = serde_json::from_str::<AnthropicErrorResponse>(&body).ok();

    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationError(parsed.map(|p| p.error.message).unwrap_or(body)),
        429 => LlmError::RateLimitExceeded { retry_after },
        // 529 is `overloaded_error`
        500..=599 => LlmError::ServiceUnavailable(format!("HTTP {}: {}", status.as_u16(), body)),
        code => match parsed {
            Some(p) => LlmError::ProviderError {
                code: p.error.error_type,
                message: p.error.message,
            },
            None => LlmError::HttpError { status: code, body },
        },
    }
}
