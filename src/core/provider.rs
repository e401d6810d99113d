//! Provider trait for LLM implementations

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    error::LlmError,
    format::{PayloadFormat, ProviderPayload},
    types::ProviderReply,
};
use crate::anthropic::{AnthropicClient, AnthropicConfig};
use crate::huggingface::{HuggingFaceClient, HuggingFaceConfig};
use crate::openai::{OpenAiClient, OpenAiConfig};
use crate::tools::ToolDeclaration;

/// Main interface that all LLM provider adapters must satisfy
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Wire shape this provider expects its payloads in
    fn payload_format(&self) -> PayloadFormat;

    /// Send one formatted conversation and parse the reply
    ///
    /// Transient failures (rate limits, unavailability) are retried per the
    /// provider's retry policy. Anything else, including replies with an
    /// unknown finish reason, is returned immediately.
    async fn get_response(&self, payload: &ProviderPayload) -> Result<ProviderReply, LlmError>;

    /// Send several independent payloads, one after the other
    ///
    /// Each slot holds that payload's own result, so one failure does not
    /// discard the replies already received. Output order matches input order.
    async fn get_batch_response(
        &self,
        payloads: &[ProviderPayload],
    ) -> Vec<Result<ProviderReply, LlmError>> {
        let mut replies = Vec::with_capacity(payloads.len());
        for payload in payloads {
            replies.push(self.get_response(payload).await);
        }
        replies
    }
}

/// Provider selection, deserializable from any config source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// OpenAI chat completions API
    #[serde(rename = "openai")]
    OpenAi(OpenAiConfig),
    /// HuggingFace hosted inference
    #[serde(rename = "huggingface")]
    HuggingFace(HuggingFaceConfig),
    /// Anthropic messages API
    Anthropic(AnthropicConfig),
}

/// Create an LLM provider from its configuration
///
/// `tools` are advertised to providers that support function calling and
/// ignored by the rest. They only apply to payloads that carry no tool
/// declarations of their own; the [`Agent`](crate::Agent) always attaches its
/// dispatcher's declarations.
///
/// # Example
///
/// ```rust,no_run
/// use llm_wrappers::{create_provider, OpenAiConfig, ProviderConfig};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ProviderConfig::OpenAi(OpenAiConfig::from_env()?);
/// let provider = create_provider(config, Vec::new())?;
/// # Ok(())
/// # }
/// ```
pub fn create_provider(
    config: ProviderConfig,
    tools: Vec<ToolDeclaration>,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    match config {
        ProviderConfig::OpenAi(config) => {
            let client = OpenAiClient::new(config)?.with_tools(tools);
            Ok(Box::new(client))
        }
        ProviderConfig::HuggingFace(config) => {
            let client = HuggingFaceClient::new(config)?;
            Ok(Box::new(client))
        }
        ProviderConfig::Anthropic(config) => {
            let client = AnthropicClient::new(config)?.with_tools(tools);
            Ok(Box::new(client))
        }
    }
}

/// Declarations to send with `payload`: its own, else the client defaults
pub(crate) fn advertised_tools<'a>(
    payload: &'a ProviderPayload,
    defaults: &'a [ToolDeclaration],
) -> &'a [ToolDeclaration] {
    if payload.tools.is_empty() {
        defaults
    } else {
        &payload.tools
    }
}
