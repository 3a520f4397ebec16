//! LLM backend abstraction.
//!
//! Provides a unified interface for different LLM providers (local Ollama,
//! OpenAI, any OpenAI-compatible server).

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Available LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Local Ollama instance (served through its OpenAI-compatible API).
    Ollama,
    /// OpenAI API.
    OpenAi,
    /// Generic OpenAI-compatible API.
    OpenAiCompatible,
}

impl LlmProvider {
    /// Returns the provider name used in logs and errors.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "open_ai",
            Self::OpenAiCompatible => "open_ai_compatible",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for an LLM backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmBackendConfig {
    /// The provider type.
    pub provider: LlmProvider,
    /// Base URL for the API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API key (if required).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Default sampling temperature.
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Default completion token limit.
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl LlmBackendConfig {
    /// Creates a new Ollama backend configuration.
    #[must_use]
    pub fn ollama(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::Ollama,
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Creates a new OpenAI backend configuration.
    #[must_use]
    pub fn open_ai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            base_url: "https://api.openai.com".to_string(),
            model: model.into(),
            api_key: Some(api_key.into()),
            timeout_secs: default_timeout_secs(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// One single-turn completion request.
///
/// Unset sampling fields fall back to the backend's configured defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The user prompt to send.
    pub prompt: String,
    /// System prompt, if any.
    pub system: Option<String>,
    /// Temperature for sampling (0.0 - 1.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    /// Creates a request with only a user prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the max tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Chat messages for this request: the system prompt, if any, then the
    /// user prompt.
    #[must_use]
    pub fn messages(&self) -> Vec<LlmMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = self.system {
            messages.push(LlmMessage::system(system.clone()));
        }
        messages.push(LlmMessage::user(self.prompt.clone()));
        messages
    }
}

/// A chat message as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
}

impl LlmMessage {
    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Chat role. Only single-turn requests are sent, so there is no
/// assistant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The person asking.
    User,
    /// Instructions framing the request.
    System,
}

/// What a backend sent back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated content.
    pub content: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Model that generated the response, as reported by the provider.
    pub model: String,
}

/// Prompt and completion token counts. Zero when the provider omits them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens.
    pub input_tokens: u32,
    /// Number of output tokens.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// A model endpoint the answer strategies can call.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Runs one completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable, rejects the request,
    /// or sends back something unparseable.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    fn provider(&self) -> LlmProvider;

    /// Model name requests are sent with.
    fn model(&self) -> &str;
}
