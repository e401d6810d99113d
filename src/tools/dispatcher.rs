//! Tool handler and dispatcher traits

use async_trait::async_trait;

use super::declaration::ToolDeclaration;
use super::error::DispatchError;
use crate::core::types::{TerminalStatus, ToolCall, ToolResponse};

/// What a handler produced
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Text to hand back to the model
    Output(String),
    /// Stop the conversation instead of replying
    EndConversation(TerminalStatus),
}

/// A single registered capability
///
/// Implementations receive the decoded argument object and either return an
/// outcome or an error message describing what went wrong.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn invoke(&self, arguments: serde_json::Value) -> Result<ToolOutcome, String>;
}

/// Result of routing one tool call
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Send this response back to the model and keep going
    Continue(ToolResponse),
    /// The tool ended the conversation
    Terminate(TerminalStatus),
}

/// Routes model-issued tool calls to their handlers
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    /// Declarations of every tool this dispatcher can run
    fn declarations(&self) -> Vec<ToolDeclaration>;

    /// Run the tool named by `call`
    async fn dispatch(&self, call: &ToolCall) -> Result<Dispatch, DispatchError>;
}

/// Decode a call's raw argument text into a JSON object
///
/// Models send `""` for tools without parameters, which decodes to `{}`.
pub fn decode_arguments(call: &ToolCall) -> Result<serde_json::Value, DispatchError> {
    let raw = call.arguments.trim();
    if raw.is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    let invalid = |reason: String| DispatchError::InvalidArguments {
        tool_name: call.tool_name.clone(),
        arguments: call.arguments.clone(),
        reason,
    };
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    if !value.is_object() {
        return Err(invalid("expected a JSON object of named parameters".to_string()));
    }
    Ok(value)
}
