//! OpenAI client implementation

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

use super::config::OpenAiConfig;
use super::mapper::{from_openai_response, map_error_status, to_openai_request};
use super::types::{ChatCompletionRequest, ChatCompletionResponse};

/// Client for the OpenAI chat completions API
pub struct OpenAiClient {
    /// HTTP client for making requests
    http_client: Client,
    config: OpenAiConfig,
    /// Tools advertised when a payload carries none of its own
    tools: Vec<ToolDeclaration>,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the key, model or base URL is unusable.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
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

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// One HTTP round trip, no retries
    async fn send_request(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        let url = self.endpoint_url();
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_from_headers(response.headers());
            let body = response.text().await.unwrap_or_default();
            if !matches!(status.as_u16(), 429 | 500..=599) {
                error!(status = status.as_u16(), %body, "OpenAI request failed");
            }
            return Err(map_error_status(status, retry_after, body));
        }

        let body = response.text().await?;
        debug!(%body, "OpenAI raw response");
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    fn payload_format(&self) -> PayloadFormat {
        self.config.api_format.payload_format()
    }

    async fn get_response(&self, payload: &ProviderPayload) -> Result<ProviderReply, LlmError> {
        let request = to_openai_request(
            &self.config.model,
            self.config.api_format,
            payload,
            &self.config.generation,
            advertised_tools(payload, &self.tools),
        );

        let response = with_retry(&self.config.retry, || self.send_request(&request)).await?;
        from_openai_response(response)
    }
}
