//! Provider payload formatting
//!
//! Every provider expects the conversation as an ordered list of JSON turn
//! objects, but field names differ (`tool_calls` vs `function_call`, `tool`
//! vs `function` roles). Each wire shape is a [`PromptFormatter`]; the
//! [`PayloadFormat`] tag picks one and is stored with the chat context.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{Exchange, Message, PromptTurn, ResponseTurn, ToolCall, ToolResponse};
use crate::anthropic::mapper::AnthropicFormatter;
use crate::huggingface::mapper::RoleContentFormatter;
use crate::openai::mapper::{OpenAiFunctionsFormatter, OpenAiToolsFormatter};
use crate::tools::ToolDeclaration;

/// Formatted request body: one JSON object per turn, in chronological order
///
/// `tools` are the declarations the caller can dispatch for this request.
/// Providers with function calling advertise them; an empty list falls back to
/// whatever the client was configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPayload {
    pub messages: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDeclaration>,
}

impl ProviderPayload {
    pub fn new(messages: Vec<Value>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
        }
    }

    /// Attach the tool declarations to advertise with this request
    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Turns typed conversation turns into a provider's wire objects
pub trait PromptFormatter: Send + Sync {
    /// Format a plain message (system, user, or assistant)
    fn format_message(&self, message: &Message) -> Value;

    /// Format an assistant tool call
    fn format_tool_call(&self, call: &ToolCall) -> Value;

    /// Format a tool result
    fn format_tool_response(&self, response: &ToolResponse) -> Value;

    fn format_prompt(&self, turn: &PromptTurn) -> Value {
        match turn {
            PromptTurn::User(message) => self.format_message(message),
            PromptTurn::Tool(response) => self.format_tool_response(response),
        }
    }

    fn format_response(&self, turn: &ResponseTurn) -> Value {
        match turn {
            ResponseTurn::Message(message) => self.format_message(message),
            ResponseTurn::ToolCall(call) => self.format_tool_call(call),
        }
    }

    /// `[system] + flatten(history) + [pending]`, never reordered
    fn format(&self, system: &Message, history: &[Exchange], pending: &PromptTurn) -> ProviderPayload {
        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        messages.push(self.format_message(system));
        for exchange in history {
            messages.push(self.format_prompt(&exchange.prompt));
            messages.push(self.format_response(&exchange.response));
        }
        messages.push(self.format_prompt(pending));
        ProviderPayload::new(messages)
    }
}

/// Which wire shape a context is formatted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// OpenAI chat completions with `tools` / `tool_calls`
    #[default]
    OpenAiTools,
    /// OpenAI chat completions with the legacy `functions` / `function_call`
    OpenAiFunctions,
    /// Bare `{role, content}` objects, as fed to HuggingFace chat templates
    RoleContent,
    /// Anthropic messages with `tool_use` / `tool_result` content blocks
    Anthropic,
}

impl PayloadFormat {
    pub fn formatter(&self) -> &'static dyn PromptFormatter {
        match self {
            PayloadFormat::OpenAiTools => &OpenAiToolsFormatter,
            PayloadFormat::OpenAiFunctions => &OpenAiFunctionsFormatter,
            PayloadFormat::RoleContent => &RoleContentFormatter,
            PayloadFormat::Anthropic => &AnthropicFormatter,
        }
    }
}

impl PromptFormatter for PayloadFormat {
    fn format_message(&self, message: &Message) -> Value {
        self.formatter().format_message(message)
    }

    fn format_tool_call(&self, call: &ToolCall) -> Value {
        self.formatter().format_tool_call(call)
    }

    fn format_tool_response(&self, response: &ToolResponse) -> Value {
        self.formatter().format_tool_response(response)
    }
}
