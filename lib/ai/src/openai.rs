//! OpenAI-compatible chat completion backend.
//!
//! Works against OpenAI itself, Ollama's `/v1` endpoint, and any server
//! that speaks the same `chat/completions` protocol.

use crate::backend::{
    LlmBackend, LlmBackendConfig, LlmMessage, LlmProvider, LlmRequest, LlmResponse, TokenUsage,
};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Backend for OpenAI-compatible `chat/completions` endpoints.
pub struct OpenAiCompatibleBackend {
    client: Client,
    config: LlmBackendConfig,
    endpoint: String,
}

impl OpenAiCompatibleBackend {
    /// Creates a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the model or base URL is empty, or if
    /// OpenAI is selected without an API key.
    pub fn new(config: LlmBackendConfig) -> Result<Self, LlmError> {
        if config.model.trim().is_empty() {
            return Err(LlmError::InvalidConfig {
                reason: "model must not be empty".to_string(),
            });
        }
        if config.base_url.trim().is_empty() {
            return Err(LlmError::InvalidConfig {
                reason: "base_url must not be empty".to_string(),
            });
        }
        if config.provider == LlmProvider::OpenAi
            && config.api_key.as_deref().is_none_or(str::is_empty)
        {
            return Err(LlmError::InvalidConfig {
                reason: "the open_ai provider requires an api_key".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: e.to_string(),
            })?;

        let endpoint = chat_completions_url(&config.base_url);
        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    /// Returns the URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify_send_error(&self, error: &reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout
        } else if error.is_connect() {
            LlmError::ProviderUnavailable {
                provider: self.config.provider.to_string(),
                reason: error.to_string(),
            }
        } else {
            LlmError::RequestFailed {
                reason: error.to_string(),
            }
        }
    }
}

/// Builds the chat completions URL, tolerating a trailing `/v1`.
fn chat_completions_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{base}/chat/completions")
    } else {
        format!("{base}/v1/chat/completions")
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<LlmMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl ChatCompletionResponse {
    fn into_llm_response(self, fallback_model: &str) -> Result<LlmResponse, LlmError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ResponseParseFailed {
                reason: "response contained no choices".to_string(),
            })?;

        let usage = self
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
            model: self.model.unwrap_or_else(|| fallback_model.to_string()),
        })
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: request.messages(),
            temperature: request.temperature.or(self.config.temperature),
            max_tokens: request.max_tokens.or(self.config.max_tokens),
        };

        let mut http_request = self.client.post(&self.endpoint).json(&body);
        if let Some(api_key) = self.config.api_key.as_deref()
            && !api_key.is_empty()
        {
            http_request = http_request.bearer_auth(api_key);
        }

        debug!(
            endpoint = %self.endpoint,
            model = %self.config.model,
            "sending chat completion request"
        );

        let response = http_request.send().await.map_err(|e| {
            warn!(error = %e, endpoint = %self.endpoint, "chat completion request failed");
            self.classify_send_error(&e)
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return Err(LlmError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, endpoint = %self.endpoint, "provider returned error status");
            return Err(LlmError::ErrorStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;

        parsed.into_llm_response(&self.config.model)
    }

    fn provider(&self) -> LlmProvider {
        self.config.provider
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
