//! Anthropic messages API client implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use crate::core::{
    error::LlmError,
    format::{PayloadFormat, ProviderPayload},
    provider::{advertised_tools, LlmProvider},
    retry::{retry_after_from_headers, with_retry},
    types::ProviderReply,
};
use crate::tools::ToolDeclaration;

use super::config::{AnthropicConfig, API_VERSION};
use super::mapper::{from_anthropic_response, map_error_status, to_anthropic_request};
use super::types::{MessagesRequest, MessagesResponse};

/// Client for Claude models on the Anthropic messages API
pub struct AnthropicClient {
    /// HTTP client for making requests
    http_client: Client,
    config: AnthropicConfig,
    /// Tools advertised when a payload carries none of its own
    tools: Vec<ToolDeclaration>,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the key, model, base URL or sampling
    /// parameters are unusable.
    pub fn new(config: AnthropicConfig) -> Result<Self, LlmError> {
        config.validate()?;

        let mut builder = Client::builder().connect_timeout(Duration::from_secs(5));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build().map_err(|e| LlmError::HttpError {
            status: 0,
            body: format!("Failed to create HTTP client: {}", e),
        })?;

        Ok(Self {
            http_client,
            config,
            tools: Vec::new(),
        })
    }

    /// Advertise these tools with requests whose payload lists no tools
    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn endpoint_url(&self) -> String {
        format!("{}/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// One HTTP round trip, no retries
    async fn send_request(&self, request: &MessagesRequest) -> Result<MessagesResponse, LlmError> {
        let url = self.endpoint_url();
        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_from_headers(response.headers());
            let body = response.text().await.unwrap_or_default();
            if !matches!(status.as_u16(), 429 | 500..=599) {
                error!(status = status.as_u16(), %body, "Anthropic request failed");
            }
            return Err(map_error_status(status, retry_after, body));
        }

        let body = response.text().await?;
        debug!(%body, "Anthropic raw response");
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    fn payload_format(&self) -> PayloadFormat {
        PayloadFormat::Anthropic
    }

    async fn get_response(&self, payload: &ProviderPayload) -> Result<ProviderReply, LlmError> {
        let request = to_anthropic_request(
            &self.config.model,
            payload,
            &self.config.generation,
            advertised_tools(payload, &self.tools),
        );

        let response = with_retry(&self.config.retry, || self.send_request(&request)).await?;
        from_anthropic_response(response)
    }
}
