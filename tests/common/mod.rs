//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use llm_wrappers::{LlmError, LlmProvider, PayloadFormat, ProviderPayload, ProviderReply, ToolCall};

/// Provider replaying a fixed script of replies and recording every payload
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<ProviderReply, LlmError>>>,
    requests: Arc<Mutex<Vec<ProviderPayload>>>,
    format: PayloadFormat,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<ProviderReply, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
            format: PayloadFormat::OpenAiTools,
        }
    }

    pub fn with_format(mut self, format: PayloadFormat) -> Self {
        self.format = format;
        self
    }

    /// Handle on the recorded payloads, usable after the provider is boxed
    pub fn requests(&self) -> Arc<Mutex<Vec<ProviderPayload>>> {
        self.requests.clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn payload_format(&self) -> PayloadFormat {
        self.format
    }

    async fn get_response(&self, payload: &ProviderPayload) -> Result<ProviderReply, LlmError> {
        self.requests.lock().unwrap().push(payload.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::ServiceUnavailable("script exhausted".to_string())))
    }
}

pub fn text(reply: &str) -> Result<ProviderReply, LlmError> {
    Ok(ProviderReply::text(reply))
}

pub fn tool_call(name: &str, call_id: &str, arguments: &str) -> Result<ProviderReply, LlmError> {
    Ok(ProviderReply::tool_call(ToolCall::new(name, call_id, arguments)))
}

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
