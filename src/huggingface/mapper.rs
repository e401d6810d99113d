//! Mapping between wrapper types and HuggingFace text-generation types

use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

use crate::core::{
    config::GenerationConfig,
    error::LlmError,
    format::{PromptFormatter, ProviderPayload},
    types::{FinishReason, Message, ProviderReply, ResponseTurn, ToolCall, ToolResponse, UsageMetadata},
};

use super::template::ChatTemplate;
use super::types::{GenerationParameters, HfErrorResponse, TextGenerationRequest, TextGenerationResponse};

/// Plain `{role, content}` turns
///
/// Chat templates have no notion of tool turns, so those are flattened into
/// text on the nearest supported role.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleContentFormatter;

impl PromptFormatter for RoleContentFormatter {
    fn format_message(&self, message: &Message) -> Value {
        json!({"role": message.role.as_str(), "content": message.text})
    }

    fn format_tool_call(&self, call: &ToolCall) -> Value {
        json!({
            "role": call.role().as_str(),
            "content": format!("Calling `{}` with {}", call.tool_name, call.arguments),
        })
    }

    fn format_tool_response(&self, response: &ToolResponse) -> Value {
        json!({
            "role": "user",
            "content": format!("Result of `{}`: {}", response.tool_name, response.result),
        })
    }
}

/// Build the text-generation request for one payload
pub fn to_hf_request(
    template: ChatTemplate,
    payload: &ProviderPayload,
    generation: &GenerationConfig,
) -> TextGenerationRequest {
    TextGenerationRequest {
        inputs: template.render(&payload.messages),
        parameters: GenerationParameters {
            max_new_tokens: generation.max_tokens,
            temperature: generation.temperature,
            top_p: generation.top_p,
            top_k: generation.top_k,
            stop: generation.stop_sequences.clone().unwrap_or_default(),
            return_full_text: false,
            details: true,
        },
    }
}

/// Parse generated text into a typed reply
pub fn from_hf_response(
    template: ChatTemplate,
    response: TextGenerationResponse,
) -> Result<ProviderReply, LlmError> {
    let generation = response.into_first().ok_or_else(|| LlmError::ProviderError {
        code: "empty_response".to_string(),
        message: "Text generation returned no output".to_string(),
    })?;

    let (finish_reason, generated_tokens) = match &generation.details {
        Some(details) => (details.finish_reason.as_deref(), details.generated_tokens),
        None => (None, None),
    };

    let finish_reason = match finish_reason {
        None | Some("eos_token") | Some("stop_sequence") => FinishReason::Stop,
        Some("length") => {
            warn!("HuggingFace reply hit the token limit; content may be incomplete");
            FinishReason::Length
        }
        Some(other) => {
            return Err(LlmError::UnrecognizedResponseKind {
                finish_reason: other.to_string(),
            })
        }
    };

    let text = template.parse_response(&generation.generated_text);
    Ok(ProviderReply {
        turn: ResponseTurn::Message(Message::assistant(text)),
        finish_reason,
        usage: generated_tokens.map(|tokens| UsageMetadata::new(0, tokens)),
    })
}

/// Map a non-success status and its body to an error
pub fn map_error_status(status: StatusCode, retry_after: Option<Duration>, body: String) -> LlmError {
    let message = serde_json::from_str::<HfErrorResponse>(&body)
        .map(|parsed| match parsed.estimated_time {
            Some(eta) => format!("{} (estimated time {:.0}s)", parsed.error, eta),
            None => parsed.error,
        })
        .unwrap_or(body);

    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationError(message),
        429 => LlmError::RateLimitExceeded { retry_after },
        500..=599 => LlmError::ServiceUnavailable(format!("HTTP {}: {}", status.as_u16(), message)),
        400 | 422 => LlmError::ProviderError {
            code: status.as_u16().to_string(),
            message,
        },
        code => LlmError::HttpError { status: code, body: message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: Value) -> TextGenerationResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_formatter_flattens_tool_turns() {
        let value = RoleContentFormatter.format_tool_call(&ToolCall::new("lookup", "c1", r#"{"id":1}"#));
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"], r#"Calling `lookup` with {"id":1}"#);

        let value = RoleContentFormatter.format_tool_response(&ToolResponse::new("lookup", "c1", "42"));
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "Result of `lookup`: 42");
    }

    #[test]
    fn test_request_uses_template_and_generation_config() {
        let payload = ProviderPayload::new(vec![
            json!({"role": "system", "content": "Be brief."}),
            json!({"role": "user", "content": "Hi"}),
        ]);
        let config = GenerationConfig::new(64)
            .with_top_k(40)
            .with_stop_sequences(vec!["</s>".to_string()]);

        let request = to_hf_request(ChatTemplate::Zephyr, &payload, &config);
        assert!(request.inputs.ends_with("<|assistant|>\n"));
        assert_eq!(request.parameters.max_new_tokens, 64);
        assert_eq!(request.parameters.top_k, Some(40));
        assert_eq!(request.parameters.stop, vec!["</s>".to_string()]);
        assert!(!request.parameters.return_full_text);
        assert!(request.parameters.details);
    }

    #[test]
    fn test_parse_finish_reasons() {
        let reply = from_hf_response(
            ChatTemplate::Zephyr,
            response(json!([{"generated_text": " Hello! ", "details": {"finish_reason": "eos_token", "generated_tokens": 3}}])),
        )
        .unwrap();
        assert_eq!(reply.turn, ResponseTurn::Message(Message::assistant("Hello!")));
        assert_eq!(reply.finish_reason, FinishReason::Stop);
        assert_eq!(reply.usage.map(|u| u.output_tokens), Some(3));

        let reply = from_hf_response(
            ChatTemplate::Zephyr,
            response(json!([{"generated_text": "Once", "details": {"finish_reason": "length"}}])),
        )
        .unwrap();
        assert!(reply.is_truncated());

        let reply = from_hf_response(ChatTemplate::ChatMl, response(json!({"generated_text": "ok"}))).unwrap();
        assert_eq!(reply.finish_reason, FinishReason::Stop);
        assert!(reply.usage.is_none());
    }

    #[test]
    fn test_parse_unknown_finish_reason() {
        let result = from_hf_response(
            ChatTemplate::Zephyr,
            response(json!([{"generated_text": "", "details": {"finish_reason": "aborted"}}])),
        );
        assert!(matches!(
            result,
            Err(LlmError::UnrecognizedResponseKind { ref finish_reason }) if finish_reason == "aborted"
        ));
    }

    #[test]
    fn test_parse_empty_output() {
        let result = from_hf_response(ChatTemplate::Zephyr, response(json!([])));
        assert!(matches!(result, Err(LlmError::ProviderError { .. })));
    }

    #[test]
    fn test_error_status_mapping() {
        let err = map_error_status(
            StatusCode::SERVICE_UNAVAILABLE,
            None,
            r#"{"error": "Model is currently loading", "estimated_time": 20.0}"#.to_string(),
        );
        match err {
            LlmError::ServiceUnavailable(message) => {
                assert!(message.contains("Model is currently loading"));
                assert!(message.contains("20s"));
            }
            other => panic!("Expected ServiceUnavailable, got {:?}", other),
        }

        let err = map_error_status(StatusCode::TOO_MANY_REQUESTS, None, String::new());
        assert!(err.is_transient());

        let err = map_error_status(StatusCode::UNAUTHORIZED, None, r#"{"error": "Invalid token"}"#.to_string());
        assert!(matches!(err, LlmError::AuthenticationError(ref m) if m == "Invalid token"));

        let err = map_error_status(StatusCode::UNPROCESSABLE_ENTITY, None, r#"{"error": "Input too long"}"#.to_string());
        assert!(matches!(err, LlmError::ProviderError { ref code, .. } if code == "422"));
    }
}
