//! Anthropic provider implementation
//!
//! Claude models over the messages API. The system prompt travels as a
//! top-level field, tool calls arrive as `tool_use` content blocks, and tool
//! results go back as `tool_result` blocks in a user turn.

pub mod client;
pub mod config;
pub mod mapper;
pub mod types;

pub use client::AnthropicClient;
pub use config::AnthropicConfig;
