use crate::core::error::LlmError;
use crate::tools::DispatchError;

/// Errors that can occur while driving a conversation
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Error from the LLM provider
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// A tool call could not be dispatched
    #[error("Tool dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// The model kept calling tools past the per-turn cap
    #[error("Tool call limit reached ({0})")]
    ToolCallLimitExceeded(usize),

    /// An exchange violated the prompt/response role constraints
    #[error("Invalid turn: {0}")]
    InvalidTurn(String),

    /// The model asked for a tool where only text is accepted
    #[error("Unexpected tool call to `{tool_name}` in completion mode")]
    UnexpectedToolCall { tool_name: String },
}
