//! Free-form explanatory answers.

use crate::backend::{LlmBackend, TokenUsage};
use crate::error::AiError;
use crate::llm_call::{LlmCall, LlmCallConfig, LlmInvocationId};
use crate::prompt::{self, PromptTemplate};
use async_trait::async_trait;
use helmsman_core::ConversationId;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Details about how a summary was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryMetadata {
    /// Invocation that produced the text.
    pub invocation_id: LlmInvocationId,
    /// Model that produced the text.
    pub model: String,
    /// Token usage of the call.
    pub usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Produces explanatory text for an in-domain question.
#[async_trait]
pub trait FreeFormGenerator: Send + Sync {
    /// Answers a question in prose.
    ///
    /// # Errors
    ///
    /// Returns an error if the answer could not be generated.
    async fn summarize(
        &self,
        conversation_id: &ConversationId,
        query: &str,
    ) -> Result<(String, SummaryMetadata), Report<AiError>>;
}

/// LLM-backed free-form generator.
pub struct DocsSummarizer {
    backend: Arc<dyn LlmBackend>,
    template: PromptTemplate,
    config: LlmCallConfig,
}

impl DocsSummarizer {
    /// Creates a summarizer using the default prompt.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            template: prompt::docs_summarizer(),
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
impl FreeFormGenerator for DocsSummarizer {
    #[instrument(skip_all, fields(conversation_id = %conversation_id))]
    async fn summarize(
        &self,
        conversation_id: &ConversationId,
        query: &str,
    ) -> Result<(String, SummaryMetadata), Report<AiError>> {
        let call = LlmCall::from_template(&self.template, &HashMap::from([("query", query)]))?
            .with_config(self.config);
        let result = call.execute(self.backend.as_ref()).await?;

        debug!(
            invocation_id = %result.id,
            chars = result.content.len(),
            "summary generated"
        );

        let metadata = SummaryMetadata {
            invocation_id: result.id,
            model: result.model,
            usage: result.usage,
            latency_ms: result.latency_ms,
        };
        Ok((result.content.trim().to_string(), metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_call::testing::ScriptedBackend;

    #[tokio::test]
    async fn summarizer_returns_text_and_metadata() {
        let backend = Arc::new(ScriptedBackend::ok(
            "  A Pod is the smallest deployable unit in Kubernetes.\n",
        ));
        let summarizer = DocsSummarizer::new(backend.clone());

        let (text, metadata) = summarizer
            .summarize(&ConversationId::generate(), "What is a Pod?")
            .await
            .expect("summarize");

        assert_eq!(text, "A Pod is the smallest deployable unit in Kubernetes.");
        assert_eq!(metadata.model, "scripted");
        assert_eq!(metadata.usage.total(), 15);
        assert!(backend.last_prompt().contains("What is a Pod?"));
    }

    #[tokio::test]
    async fn summarizer_sends_system_prompt() {
        let backend = Arc::new(ScriptedBackend::ok("answer"));
        let summarizer = DocsSummarizer::new(backend.clone())
            .with_config(LlmCallConfig::default().with_max_tokens(256));

        summarizer
            .summarize(&ConversationId::generate(), "What is a Service?")
            .await
            .expect("summarize");

        let requests = backend.requests.lock().unwrap();
        assert!(requests[0].system.is_some());
        assert_eq!(requests[0].max_tokens, Some(256));
    }
}
