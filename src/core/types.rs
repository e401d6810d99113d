//! Core types for the LLM wrapper layer

use serde::{Deserialize, Serialize};

/// Role of a turn's author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Fixed instructions at the head of every request
    System,
    /// Human input
    User,
    /// Model output
    Assistant,
    /// Tool execution result
    Tool,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A plain conversational turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the turn
    pub role: Role,
    /// Text content
    pub text: String,
}

impl Message {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// A model-issued request to invoke a tool
///
/// The role is always [`Role::Assistant`]. `arguments` is the raw JSON text
/// produced by the model and is only decoded at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the requested tool
    pub tool_name: String,
    /// Correlates the eventual [`ToolResponse`] with this call
    pub call_id: String,
    /// JSON-encoded argument object
    pub arguments: String,
}

impl ToolCall {
    pub fn new(
        tool_name: impl Into<String>,
        call_id: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            call_id: call_id.into(),
            arguments: arguments.into(),
        }
    }

    pub fn role(&self) -> Role {
        Role::Assistant
    }
}

/// Output of a tool, re-injected into the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Name of the tool that produced the result
    pub tool_name: String,
    /// Id of the [`ToolCall`] this answers
    pub call_id: String,
    /// Result coerced to text
    pub result: String,
}

impl ToolResponse {
    pub fn new(
        tool_name: impl Into<String>,
        call_id: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            call_id: call_id.into(),
            result: result.into(),
        }
    }

    pub fn role(&self) -> Role {
        Role::Tool
    }
}

/// First half of an exchange: what was sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromptTurn {
    /// A user message
    User(Message),
    /// A tool result answering the previous tool call
    Tool(ToolResponse),
}

impl PromptTurn {
    /// Build a user prompt from raw text
    pub fn user(text: impl Into<String>) -> Self {
        PromptTurn::User(Message::user(text))
    }

    pub fn role(&self) -> Role {
        match self {
            PromptTurn::User(message) => message.role,
            PromptTurn::Tool(response) => response.role(),
        }
    }
}

impl From<ToolResponse> for PromptTurn {
    fn from(response: ToolResponse) -> Self {
        PromptTurn::Tool(response)
    }
}

/// Second half of an exchange: what the model answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseTurn {
    /// Plain text reply
    Message(Message),
    /// Request to run a tool
    ToolCall(ToolCall),
}

impl ResponseTurn {
    pub fn role(&self) -> Role {
        match self {
            ResponseTurn::Message(message) => message.role,
            ResponseTurn::ToolCall(call) => call.role(),
        }
    }
}

/// A (prompt, response) pair recorded in chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub prompt: PromptTurn,
    pub response: ResponseTurn,
}

/// Reason why generation finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural completion
    Stop,
    /// Waiting for tool execution
    ToolCall,
    /// Hit the token limit; content may be incomplete
    Length,
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Prompt tokens consumed
    pub input_tokens: u32,
    /// Response tokens generated
    pub output_tokens: u32,
    /// Sum of input and output
    pub total_tokens: u32,
}

impl UsageMetadata {
    /// Create new usage metadata
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }

    /// Add usage from another metadata
    pub fn add(&mut self, other: &UsageMetadata) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens = self.input_tokens + self.output_tokens;
    }
}

/// A provider reply parsed into a typed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReply {
    /// The assistant turn (text or tool call)
    pub turn: ResponseTurn,
    /// Terminal condition reported by the provider
    pub finish_reason: FinishReason,
    /// Token accounting, when the provider reports it
    pub usage: Option<UsageMetadata>,
}

impl ProviderReply {
    /// A normally completed text reply
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            turn: ResponseTurn::Message(Message::assistant(text)),
            finish_reason: FinishReason::Stop,
            usage: None,
        }
    }

    /// A tool call reply
    pub fn tool_call(call: ToolCall) -> Self {
        Self {
            turn: ResponseTurn::ToolCall(call),
            finish_reason: FinishReason::ToolCall,
            usage: None,
        }
    }

    /// Attach usage metadata
    pub fn with_usage(mut self, usage: UsageMetadata) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Whether the content may have been cut off by the token limit
    pub fn is_truncated(&self) -> bool {
        self.finish_reason == FinishReason::Length
    }
}

/// Why a conversation was ended by a tool instead of a reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TerminalStatus {
    /// A tool handed the conversation to a human operator
    #[serde(rename = "ended_by_transfer")]
    TransferredToHuman { message: String },
    /// A tool marked the conversation complete, attaching its analysis
    #[serde(rename = "ended_by_completion")]
    Completed { analysis: serde_json::Value },
}

impl TerminalStatus {
    /// Short status label
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalStatus::TransferredToHuman { .. } => "ended_by_transfer",
            TerminalStatus::Completed { .. } => "ended_by_completion",
        }
    }
}
