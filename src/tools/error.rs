use thiserror::Error;

/// Errors raised while routing a tool call to its handler
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The model asked for a tool that was never registered
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    /// The call's arguments are not a JSON object the handler accepts
    #[error("Invalid arguments for tool `{tool_name}` ({arguments}): {reason}")]
    InvalidArguments {
        tool_name: String,
        arguments: String,
        reason: String,
    },

    /// The handler itself failed
    #[error("Tool `{tool_name}` failed with arguments {arguments}: {message}")]
    ToolFailed {
        tool_name: String,
        arguments: String,
        message: String,
    },

    /// A second handler was registered under an existing name
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),
}
