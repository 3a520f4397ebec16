//! Bare model completion, with no prompt template around the query.

use crate::backend::LlmBackend;
use crate::error::AiError;
use crate::llm_call::{LlmCall, LlmCallConfig};
use async_trait::async_trait;
use rootcause::prelude::Report;
use std::sync::Arc;

/// Sends text straight to a model and returns what it says.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Completes the query verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails.
    async fn complete(&self, query: &str) -> Result<String, Report<AiError>>;
}

/// Completion backed directly by an LLM backend.
pub struct BareCompletion {
    backend: Arc<dyn LlmBackend>,
    config: LlmCallConfig,
}

impl BareCompletion {
    /// Creates a bare completion over a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            config: LlmCallConfig::default(),
        }
    }

    /// Applies sampling parameters to every call.
    #[must_use]
    pub fn with_config(mut self, config: LlmCallConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl Completion for BareCompletion {
    async fn complete(&self, query: &str) -> Result<String, Report<AiError>> {
        let result = LlmCall::new(query)
            .with_config(self.config)
            .execute(self.backend.as_ref())
            .await?;
        Ok(result.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_call::testing::ScriptedBackend;

    #[tokio::test]
    async fn completion_is_a_pass_through() {
        let backend = Arc::new(ScriptedBackend::ok("  raw model output\n"));
        let completion = BareCompletion::new(backend.clone());

        let text = completion.complete("Tell me a joke").await.expect("complete");

        assert_eq!(text, "  raw model output\n");
        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[0].prompt, "Tell me a joke");
        assert!(requests[0].system.is_none());
    }

    #[tokio::test]
    async fn completion_applies_sampling_config() {
        let backend = Arc::new(ScriptedBackend::ok("ok"));
        let completion = BareCompletion::new(backend.clone())
            .with_config(LlmCallConfig::default().with_temperature(0.9).with_max_tokens(64));

        completion.complete("ping").await.expect("complete");

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[0].temperature, Some(0.9));
        assert_eq!(requests[0].max_tokens, Some(64));
    }
}
