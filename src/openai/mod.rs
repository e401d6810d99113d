//! OpenAI provider implementation
//!
//! This module provides a client for the OpenAI chat completions API, with
//! both the current `tools` and the legacy `functions` calling conventions.

pub mod client;
pub mod config;
pub mod mapper;
pub mod types;

// Re-export commonly used types
pub use client::OpenAiClient;
pub use config::{ApiFormat, OpenAiConfig};
