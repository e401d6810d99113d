//! Mapping between wrapper types and OpenAI-specific types

use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::core::{
    config::GenerationConfig,
    error::LlmError,
    format::{PromptFormatter, ProviderPayload},
    types::{FinishReason, Message, ProviderReply, ResponseTurn, ToolCall, ToolResponse, UsageMetadata},
};
use crate::tools::ToolDeclaration;

use super::config::ApiFormat;
use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, Choice, FunctionDefinition, OpenAiErrorResponse,
    OpenAiTool,
};

/// Chat completions with `tools` / `tool_calls`
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiToolsFormatter;

impl PromptFormatter for OpenAiToolsFormatter {
    fn format_message(&self, message: &Message) -> Value {
        json!({"role": message.role.as_str(), "content": message.text})
    }

    fn format_tool_call(&self, call: &ToolCall) -> Value {
        json!({
            "role": call.role().as_str(),
            "content": null,
            "tool_calls": [{
                "id": call.call_id,
                "type": "function",
                "function": {"name": call.tool_name, "arguments": call.arguments},
            }],
        })
    }

    fn format_tool_response(&self, response: &ToolResponse) -> Value {
        json!({
            "role": response.role().as_str(),
            "tool_call_id": response.call_id,
            "name": response.tool_name,
            "content": response.result,
        })
    }
}

/// Legacy chat completions with `functions` / `function_call`
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiFunctionsFormatter;

impl PromptFormatter for OpenAiFunctionsFormatter {
    fn format_message(&self, message: &Message) -> Value {
        OpenAiToolsFormatter.format_message(message)
    }

    fn format_tool_call(&self, call: &ToolCall) -> Value {
        json!({
            "role": call.role().as_str(),
            "content": null,
            "function_call": {"name": call.tool_name, "arguments": call.arguments},
        })
    }

    fn format_tool_response(&self, response: &ToolResponse) -> Value {
        json!({
            "role": "function",
            "name": response.tool_name,
            "content": response.result,
        })
    }
}

fn to_function_definition(tool: ToolDeclaration) -> FunctionDefinition {
    FunctionDefinition {
        name: tool.name,
        description: tool.description,
        parameters: tool.parameters,
    }
}

/// Build the request body for one payload
pub fn to_openai_request(
    model: &str,
    format: ApiFormat,
    payload: &ProviderPayload,
    generation: &GenerationConfig,
    tools: &[ToolDeclaration],
) -> ChatCompletionRequest {
    let mut request = ChatCompletionRequest {
        model: model.to_string(),
        messages: payload.messages.clone(),
        max_tokens: Some(generation.max_tokens),
        temperature: generation.temperature,
        top_p: generation.top_p,
        stop: generation.stop_sequences.clone(),
        tools: None,
        parallel_tool_calls: None,
        functions: None,
    };

    if !tools.is_empty() {
        let definitions = tools.iter().cloned().map(to_function_definition);
        match format {
            ApiFormat::Tools => {
                request.tools = Some(
                    definitions
                        .map(|function| OpenAiTool {
                            tool_type: "function".to_string(),
                            function,
                        })
                        .collect(),
                );
                // The chat loop answers one call per turn
                request.parallel_tool_calls = Some(false);
            }
            ApiFormat::Functions => request.functions = Some(definitions.collect()),
        }
    }

    request
}

/// Parse a completion into a typed reply
///
/// Only the first choice is considered.
pub fn from_openai_response(response: ChatCompletionResponse) -> Result<ProviderReply, LlmError> {
    let usage = response
        .usage
        .map(|u| UsageMetadata::new(u.prompt_tokens, u.completion_tokens));

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::ProviderError {
            code: "empty_response".to_string(),
            message: "Completion contained no choices".to_string(),
        })?;

    let finish_reason = match (choice.finish_reason.as_deref(), &choice.finish_details) {
        (Some(reason), _) => reason.to_string(),
        (None, Some(details)) if details.finish_type == "max_tokens" => "length".to_string(),
        (None, Some(details)) if details.finish_type == "stop" => "stop".to_string(),
        (None, _) => "null".to_string(),
    };

    let reply = match finish_reason.as_str() {
        "stop" => {
            let ignored = ignored_calls(&choice);
            if !ignored.is_empty() {
                warn!(?ignored, "Stop reply also carried tool calls; they are not dispatched");
            }
            text_reply(choice, FinishReason::Stop)
        }
        "length" => {
            warn!("OpenAI reply hit the token limit; content may be incomplete");
            text_reply(choice, FinishReason::Length)
        }
        "tool_calls" | "function_call" => tool_call_reply(choice)?,
        _ => {
            return Err(LlmError::UnrecognizedResponseKind {
                finish_reason: finish_reason.clone(),
            })
        }
    };

    Ok(match usage {
        Some(usage) => reply.with_usage(usage),
        None => reply,
    })
}

/// Names of any tool or function calls riding along with a text reply
fn ignored_calls(choice: &Choice) -> Vec<&str> {
    let message = &choice.message;
    let tools = message.tool_calls.iter().flatten().map(|c| c.function.name.as_str());
    let legacy = message.function_call.iter().map(|f| f.name.as_str());
    tools.chain(legacy).collect()
}

fn text_reply(choice: Choice, finish_reason: FinishReason) -> ProviderReply {
    ProviderReply {
        turn: ResponseTurn::Message(Message::assistant(choice.message.content.unwrap_or_default())),
        finish_reason,
        usage: None,
    }
}

fn tool_call_reply(choice: Choice) -> Result<ProviderReply, LlmError> {
    let message = choice.message;

    if let Some(calls) = message.tool_calls.filter(|calls| !calls.is_empty()) {
        if calls.len() > 1 {
            let dropped: Vec<&str> = calls[1..].iter().map(|c| c.function.name.as_str()).collect();
            warn!(?dropped, "Model issued several tool calls; only the first is answered");
        }
        if let Some(call) = calls.into_iter().next() {
            return Ok(ProviderReply::tool_call(ToolCall::new(
                call.function.name,
                call.id,
                call.function.arguments,
            )));
        }
    }

    if let Some(function) = message.function_call {
        // Legacy function calls carry no id
        let call_id = format!("call_{}", Uuid::new_v4().simple());
        return Ok(ProviderReply::tool_call(ToolCall::new(
            function.name,
            call_id,
            function.arguments,
        )));
    }

    Err(LlmError::ProviderError {
        code: "missing_tool_call".to_string(),
        message: "Finish reason requested a tool call but none was included".to_string(),
    })
}

/// Map a non-success status and its body to an error
pub fn map_error_status(status: StatusCode, retry_after: Option<Duration>, body: String) -> LlmError {
    let parsed = serde_json::from_str::<OpenAiErrorResponse>(&body).ok();

    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationError(
            parsed.map(|p| p.error.message).unwrap_or(body),
        ),
        429 => match parsed {
            // Quota exhaustion is reported as 429 but waiting does not help
            Some(p) if p.error.code_str() == "insufficient_quota" => LlmError::ProviderError {
                code: p.error.code_str(),
                message: p.error.message,
            },
            _ => LlmError::RateLimitExceeded { retry_after },
        },
        500..=599 => LlmError::ServiceUnavailable(format!("HTTP {}: {}", status.as_u16(), body)),
        code => match parsed {
            Some(p) => LlmError::ProviderError {
                code: p.error.code_str(),
                message: p.error.message,
            },
            None => LlmError::HttpError { status: code, body },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Role;

    fn response(json: Value) -> ChatCompletionResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_tools_formatter_tool_turns() {
        let call = ToolCall::new("get_order_status", "call_1", r#"{"order_id":"10050"}"#);
        let value = OpenAiToolsFormatter.format_tool_call(&call);
        assert_eq!(value["role"], "assistant");
        assert!(value["content"].is_null());
        assert_eq!(value["tool_calls"][0]["id"], "call_1");
        assert_eq!(value["tool_calls"][0]["type"], "function");
        assert_eq!(value["tool_calls"][0]["function"]["name"], "get_order_status");
        assert_eq!(value["tool_calls"][0]["function"]["arguments"], r#"{"order_id":"10050"}"#);

        let result = ToolResponse::new("get_order_status", "call_1", "In Transit");
        let value = OpenAiToolsFormatter.format_tool_response(&result);
        assert_eq!(value["role"], "tool");
        assert_eq!(value["tool_call_id"], "call_1");
        assert_eq!(value["name"], "get_order_status");
        assert_eq!(value["content"], "In Transit");
    }

    #[test]
    fn test_functions_formatter_tool_turns() {
        let call = ToolCall::new("get_order_status", "call_1", "{}");
        let value = OpenAiFunctionsFormatter.format_tool_call(&call);
        assert_eq!(value["function_call"]["name"], "get_order_status");
        assert!(value.get("tool_calls").is_none());

        let result = ToolResponse::new("get_order_status", "call_1", "Delivered");
        let value = OpenAiFunctionsFormatter.format_tool_response(&result);
        assert_eq!(value["role"], "function");
        assert_eq!(value["name"], "get_order_status");

        let value = OpenAiFunctionsFormatter.format_message(&Message::system("sys"));
        assert_eq!(value["role"], Role::System.as_str());
    }

    #[test]
    fn test_request_advertises_tools() {
        let payload = ProviderPayload::new(vec![json!({"role": "user", "content": "hi"})]);
        let tools = vec![ToolDeclaration::new("request_transfer_to_human", "Transfer")];
        let config = GenerationConfig::new(512).with_temperature(0.2);

        let request = to_openai_request("gpt-4o-mini", ApiFormat::Tools, &payload, &config, &tools);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "request_transfer_to_human");
        assert_eq!(json["parallel_tool_calls"], false);
        assert_eq!(json["max_tokens"], 512);
        assert!(json.get("functions").is_none());

        let request = to_openai_request("gpt-4o-mini", ApiFormat::Functions, &payload, &config, &tools);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["functions"][0]["name"], "request_transfer_to_human");
        assert!(json.get("tools").is_none());
        assert!(json.get("parallel_tool_calls").is_none());
    }

    #[test]
    fn test_request_without_tools() {
        let payload = ProviderPayload::new(vec![]);
        let request = to_openai_request("m", ApiFormat::Tools, &payload, &GenerationConfig::default(), &[]);
        assert!(request.tools.is_none());
        assert!(request.parallel_tool_calls.is_none());
    }

    #[test]
    fn test_parse_stop() {
        let reply = from_openai_response(response(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        })))
        .unwrap();

        assert_eq!(reply.turn, ResponseTurn::Message(Message::assistant("Hello!")));
        assert_eq!(reply.finish_reason, FinishReason::Stop);
        assert_eq!(reply.usage, Some(UsageMetadata::new(10, 2)));
    }

    #[test]
    fn test_parse_stop_with_stray_tool_calls_keeps_text() {
        let choice_json = json!({
            "message": {"role": "assistant", "content": "Your order is on its way.", "tool_calls": [
                {"id": "call_9", "type": "function", "function": {"name": "get_order_status", "arguments": "{}"}}
            ]},
            "finish_reason": "stop"
        });
        let choice: Choice = serde_json::from_value(choice_json.clone()).unwrap();
        assert_eq!(ignored_calls(&choice), vec!["get_order_status"]);

        let reply = from_openai_response(response(json!({"choices": [choice_json]}))).unwrap();
        assert_eq!(reply.finish_reason, FinishReason::Stop);
        assert_eq!(
            reply.turn,
            ResponseTurn::Message(Message::assistant("Your order is on its way."))
        );

        let plain: Choice = serde_json::from_value(json!({
            "message": {"content": "hi"}, "finish_reason": "stop"
        }))
        .unwrap();
        assert!(ignored_calls(&plain).is_empty());
    }

    #[test]
    fn test_parse_first_tool_call_only() {
        let reply = from_openai_response(response(json!({
            "choices": [{
                "message": {"role": "assistant", "content": null, "tool_calls": [
                    {"id": "call_1", "type": "function", "function": {"name": "get_order_status", "arguments": "{\"order_id\":\"10050\"}"}},
                    {"id": "call_2", "type": "function", "function": {"name": "get_product_price", "arguments": "{}"}}
                ]},
                "finish_reason": "tool_calls"
            }]
        })))
        .unwrap();

        assert_eq!(
            reply.turn,
            ResponseTurn::ToolCall(ToolCall::new("get_order_status", "call_1", r#"{"order_id":"10050"}"#))
        );
        assert_eq!(reply.finish_reason, FinishReason::ToolCall);
    }

    #[test]
    fn test_parse_legacy_function_call() {
        let reply = from_openai_response(response(json!({
            "choices": [{
                "message": {"role": "assistant", "content": null,
                            "function_call": {"name": "get_order_status", "arguments": "{}"}},
                "finish_reason": "function_call"
            }]
        })))
        .unwrap();

        match reply.turn {
            ResponseTurn::ToolCall(call) => {
                assert_eq!(call.tool_name, "get_order_status");
                assert!(call.call_id.starts_with("call_"));
            }
            other => panic!("Expected tool call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_length_is_truncated_message() {
        let reply = from_openai_response(response(json!({
            "choices": [{"message": {"content": "Once upon a"}, "finish_reason": "length"}]
        })))
        .unwrap();
        assert!(reply.is_truncated());
        assert_eq!(reply.turn, ResponseTurn::Message(Message::assistant("Once upon a")));
    }

    #[test]
    fn test_parse_finish_details_max_tokens() {
        let reply = from_openai_response(response(json!({
            "choices": [{"message": {"content": "A picture of"}, "finish_reason": null,
                         "finish_details": {"type": "max_tokens"}}]
        })))
        .unwrap();
        assert!(reply.is_truncated());
    }

    #[test]
    fn test_parse_unknown_finish_reason() {
        let result = from_openai_response(response(json!({
            "choices": [{"message": {"content": ""}, "finish_reason": "content_filter"}]
        })));
        assert!(matches!(
            result,
            Err(LlmError::UnrecognizedResponseKind { ref finish_reason }) if finish_reason == "content_filter"
        ));

        let result = from_openai_response(response(json!({
            "choices": [{"message": {"content": ""}}]
        })));
        assert!(matches!(result, Err(LlmError::UnrecognizedResponseKind { .. })));
    }

    #[test]
    fn test_parse_empty_choices() {
        let result = from_openai_response(response(json!({"choices": []})));
        assert!(matches!(result, Err(LlmError::ProviderError { .. })));
    }

    #[test]
    fn test_error_status_mapping() {
        let err = map_error_status(StatusCode::TOO_MANY_REQUESTS, Some(Duration::from_secs(2)), String::new());
        assert!(matches!(err, LlmError::RateLimitExceeded { retry_after: Some(d) } if d == Duration::from_secs(2)));

        let quota = r#"{"error": {"message": "You exceeded your quota", "type": "insufficient_quota", "code": "insufficient_quota"}}"#;
        let err = map_error_status(StatusCode::TOO_MANY_REQUESTS, None, quota.to_string());
        assert!(!err.is_transient());

        let err = map_error_status(
            StatusCode::UNAUTHORIZED,
            None,
            r#"{"error": {"message": "Incorrect API key", "type": "invalid_request_error"}}"#.to_string(),
        );
        assert!(matches!(err, LlmError::AuthenticationError(ref m) if m == "Incorrect API key"));

        let err = map_error_status(StatusCode::BAD_GATEWAY, None, "upstream".to_string());
        assert!(err.is_transient());

        let err = map_error_status(StatusCode::NOT_FOUND, None, "nope".to_string());
        assert!(matches!(err, LlmError::HttpError { status: 404, .. }));
    }
}
