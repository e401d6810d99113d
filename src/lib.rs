//! Thin wrappers around hosted LLM chat APIs
//!
//! This crate provides a unified interface for chatting with OpenAI, Anthropic
//! and HuggingFace-hosted models: conversation state in a [`ChatContext`],
//! per-provider payload formatting, tool dispatch through a [`ToolRegistry`],
//! and an [`Agent`] that loops over tool calls until the model answers.

pub mod agent;
pub mod anthropic;
pub mod context;
pub mod core;
pub mod huggingface;
pub mod openai;
pub mod tools;

// Re-export commonly used types
pub use agent::{Agent, AgentError, ChatOutcome};
pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use context::{ChatContext, CompletionContext};
pub use core::{
    config::{GenerationConfig, GenerationLimits},
    error::LlmError,
    format::{PayloadFormat, PromptFormatter, ProviderPayload},
    provider::{create_provider, LlmProvider, ProviderConfig},
    retry::RetryPolicy,
    types::{
        Exchange, FinishReason, Message, PromptTurn, ProviderReply, ResponseTurn, Role,
        TerminalStatus, ToolCall, ToolResponse, UsageMetadata,
    },
};
pub use huggingface::{ChatTemplate, HuggingFaceClient, HuggingFaceConfig};
pub use openai::{ApiFormat, OpenAiClient, OpenAiConfig};
pub use tools::{
    create_tool_declaration, Dispatch, DispatchError, ToolDeclaration, ToolDispatcher, ToolHandler,
    ToolOutcome, ToolParam, ToolParamType, ToolRegistration, ToolRegistry,
};

pub use llm_wrappers_macros::tool;
