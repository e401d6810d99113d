//! HuggingFace Inference API client implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use crate::core::{
    error::LlmError,
    format::{PayloadFormat, ProviderPayload},
    provider::LlmProvider,
    retry::{retry_after_from_headers, with_retry},
    types::ProviderReply,
};

use super::config::HuggingFaceConfig;
use super::mapper::{from_hf_response, map_error_status, to_hf_request};
use super::template::ChatTemplate;
use super::types::{TextGenerationRequest, TextGenerationResponse};

/// Client for chat-tuned causal models served by the Inference API
///
/// These models cannot call tools; every reply is plain text.
pub struct HuggingFaceClient {
    /// HTTP client for making requests
    http_client: Client,
    config: HuggingFaceConfig,
    template: ChatTemplate,
}

impl HuggingFaceClient {
    /// Create a new HuggingFace client
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the key, model or base URL is unusable.
    pub fn new(config: HuggingFaceConfig) -> Result<Self, LlmError> {
        config.validate()?;

        let mut builder = Client::builder().connect_timeout(Duration::from_secs(5));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build().map_err(|e| LlmError::HttpError {
            status: 0,
            body: format!("Failed to create HTTP client: {}", e),
        })?;

        let template = config.template();
        Ok(Self {
            http_client,
            config,
            template,
        })
    }

    pub fn config(&self) -> &HuggingFaceConfig {
        &self.config
    }

    pub fn template(&self) -> ChatTemplate {
        self.template
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn send_request(
        &self,
        request: &TextGenerationRequest,
    ) -> Result<TextGenerationResponse, LlmError> {
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
                error!(status = status.as_u16(), %body, "HuggingFace request failed");
            }
            return Err(map_error_status(status, retry_after, body));
        }

        let body = response.text().await?;
        debug!(%body, "HuggingFace raw response");
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl LlmProvider for HuggingFaceClient {
    fn payload_format(&self) -> PayloadFormat {
        PayloadFormat::RoleContent
    }

    async fn get_response(&self, payload: &ProviderPayload) -> Result<ProviderReply, LlmError> {
        let request = to_hf_request(self.template, payload, &self.config.generation);
        let response = with_retry(&self.config.retry, || self.send_request(&request)).await?;
        from_hf_response(self.template, response)
    }
}
