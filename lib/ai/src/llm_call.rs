//! LLM Call primitive.
//!
//! The fundamental AI operation: single-shot inference from a rendered
//! prompt template. The classifier, summarizer, YAML generator and bare
//! completion are all built on this primitive.

use crate::backend::{LlmBackend, LlmRequest, LlmResponse, TokenUsage};
use crate::error::AiError;
use crate::prompt::PromptTemplate;
use rootcause::prelude::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;
use ulid::Ulid;

/// Unique identifier for an LLM invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LlmInvocationId(Ulid);

impl LlmInvocationId {
    /// Creates a new invocation ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for LlmInvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LlmInvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "llm_{}", self.0)
    }
}

/// Sampling parameters applied to every call a strategy makes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmCallConfig {
    /// Temperature for sampling.
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

impl LlmCallConfig {
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
}

/// The result of an LLM Call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallResult {
    /// Unique identifier for this invocation.
    pub id: LlmInvocationId,
    /// The raw text output.
    pub content: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

impl LlmCallResult {
    /// Creates a result from an LLM response.
    #[must_use]
    pub fn from_response(id: LlmInvocationId, response: LlmResponse, latency_ms: u64) -> Self {
        Self {
            id,
            content: response.content,
            usage: response.usage,
            model: response.model,
            latency_ms,
        }
    }
}

/// An LLM Call executor.
///
/// Binds a prompt to sampling parameters and runs it against a backend.
#[derive(Debug, Clone)]
pub struct LlmCall {
    prompt: String,
    system_prompt: Option<String>,
    config: LlmCallConfig,
}

impl LlmCall {
    /// Creates a new LLM Call with the given prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            config: LlmCallConfig::default(),
        }
    }

    /// Renders a template into a call, carrying over its system prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be rendered.
    pub fn from_template(
        template: &PromptTemplate,
        variables: &HashMap<&str, &str>,
    ) -> Result<Self, Report<AiError>> {
        let prompt = template.render(variables).context(AiError::PromptRender {
            template: template.name.clone(),
        })?;

        Ok(Self {
            prompt,
            system_prompt: template.system_prompt.clone(),
            config: LlmCallConfig::default(),
        })
    }

    /// Applies sampling parameters.
    #[must_use]
    pub fn with_config(mut self, config: LlmCallConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds an LLM request from this configuration.
    #[must_use]
    pub fn build_request(&self) -> LlmRequest {
        let mut request = LlmRequest::new(self.prompt.clone());

        if let Some(ref system) = self.system_prompt {
            request = request.with_system(system.clone());
        }

        if let Some(temp) = self.config.temperature {
            request = request.with_temperature(temp);
        }

        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        request
    }

    /// Sends the call to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails. The backend error is
    /// kept as the cause under an `AiError::LlmCall` context.
    pub async fn execute(&self, backend: &dyn LlmBackend) -> Result<LlmCallResult, Report<AiError>> {
        let id = LlmInvocationId::new();
        let request = self.build_request();
        let started = Instant::now();

        let response = backend
            .generate(&request)
            .await
            .context(AiError::LlmCall { invocation_id: id })?;

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            invocation_id = %id,
            model = %response.model,
            latency_ms,
            output_tokens = response.usage.output_tokens,
            "LLM call completed"
        );

        Ok(LlmCallResult::from_response(id, response, latency_ms))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted backend shared by the strategy tests.

    use super::*;
    use crate::backend::LlmProvider;
    use crate::error::LlmError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that replays canned replies and records every request.
    pub struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        pub requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedBackend {
        pub fn replying(replies: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn ok(reply: &str) -> Self {
            Self::replying([Ok(reply.to_string())])
        }

        pub fn last_prompt(&self) -> String {
            self.requests
                .lock()
                .unwrap()
                .last()
                .map(|r| r.prompt.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::RequestFailed {
                    reason: "no scripted reply left".to_string(),
                }))?;
            Ok(LlmResponse {
                content: reply,
                usage: TokenUsage {
                    input_tokens: 10,
                    output_tokens: 5,
                },
                model: "scripted".to_string(),
            })
        }

        fn provider(&self) -> LlmProvider {
            LlmProvider::OpenAiCompatible
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedBackend;
    use super::*;
    use crate::error::LlmError;
    use crate::prompt::{PromptTemplate, VariableDefinition};

    #[test]
    fn llm_call_builder() {
        let call = LlmCall::new("Is this about Kubernetes?")
            .with_config(LlmCallConfig::default().with_temperature(0.3));

        let request = call.build_request();
        assert_eq!(request.prompt, "Is this about Kubernetes?");
        assert_eq!(request.system, None);
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, None);
    }

    #[test]
    fn from_template_carries_system_prompt() {
        let template = PromptTemplate::new("t", "Q: {{query}}")
            .with_system_prompt("sys")
            .with_variable("query", VariableDefinition::required("q"));

        let call = LlmCall::from_template(&template, &HashMap::from([("query", "hi")]))
            .expect("render");
        let request = call.build_request();
        assert_eq!(request.prompt, "Q: hi");
        assert_eq!(request.system.as_deref(), Some("sys"));
    }

    #[test]
    fn from_template_reports_render_failure() {
        let template = PromptTemplate::new("t", "Q: {{query}}")
            .with_variable("query", VariableDefinition::required("q"));

        let err = LlmCall::from_template(&template, &HashMap::new()).unwrap_err();
        assert_eq!(
            err.current_context(),
            &AiError::PromptRender {
                template: "t".to_string()
            }
        );
    }

    #[tokio::test]
    async fn execute_returns_content() {
        let backend = ScriptedBackend::ok("VALID,NOYAML");
        let result = LlmCall::new("prompt").execute(&backend).await.expect("call");

        assert_eq!(result.content, "VALID,NOYAML");
        assert_eq!(result.model, "scripted");
        assert_eq!(result.usage.total(), 15);
    }

    #[tokio::test]
    async fn execute_wraps_backend_error() {
        let backend = ScriptedBackend::replying([Err(LlmError::Timeout)]);
        let err = LlmCall::new("prompt").execute(&backend).await.unwrap_err();

        assert!(matches!(err.current_context(), AiError::LlmCall { .. }));
    }

    #[test]
    fn invocation_id_display() {
        let id = LlmInvocationId::new();
        let display = id.to_string();
        assert!(display.starts_with("llm_"));
    }
}
