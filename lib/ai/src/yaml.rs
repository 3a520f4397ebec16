//! Structured configuration (YAML) generation.

use crate::backend::LlmBackend;
use crate::error::AiError;
use crate::llm_call::{LlmCall, LlmCallConfig};
use crate::prompt::{self, PromptTemplate};
use async_trait::async_trait;
use helmsman_core::ConversationId;
use rootcause::prelude::Report;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Token the model is instructed to answer with when it cannot comply.
pub const SOME_FAILURE: &str = "SOME_FAILURE";

/// Result of a structured generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredOutput {
    /// A generated configuration artifact.
    Artifact(String),
    /// The generator could not produce an artifact.
    Failure,
}

/// Produces a configuration artifact for an in-domain question.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    /// Generates an artifact, using the prior transcript as context.
    ///
    /// # Errors
    ///
    /// Returns an error if the generator could not run. A generator that
    /// ran but produced nothing usable returns `StructuredOutput::Failure`.
    async fn generate(
        &self,
        conversation_id: &ConversationId,
        query: &str,
        history: Option<&str>,
    ) -> Result<StructuredOutput, Report<AiError>>;
}

/// LLM-backed YAML generator.
pub struct YamlGenerator {
    backend: Arc<dyn LlmBackend>,
    template: PromptTemplate,
    config: LlmCallConfig,
}

impl YamlGenerator {
    /// Creates a generator using the default prompt.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            template: prompt::yaml_generator(),
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
impl StructuredGenerator for YamlGenerator {
    #[instrument(skip_all, fields(conversation_id = %conversation_id, has_history = history.is_some()))]
    async fn generate(
        &self,
        conversation_id: &ConversationId,
        query: &str,
        history: Option<&str>,
    ) -> Result<StructuredOutput, Report<AiError>> {
        let mut variables = HashMap::from([("query", query)]);
        if let Some(history) = history.filter(|h| !h.trim().is_empty()) {
            variables.insert("history", history);
        }

        let call = LlmCall::from_template(&self.template, &variables)?.with_config(self.config);
        let result = call.execute(self.backend.as_ref()).await?;

        let output = extract_yaml(&result.content);
        match &output {
            StructuredOutput::Artifact(yaml) => {
                debug!(invocation_id = %result.id, chars = yaml.len(), "yaml generated");
            }
            StructuredOutput::Failure => {
                warn!(invocation_id = %result.id, "model did not produce yaml");
            }
        }
        Ok(output)
    }
}

/// Pulls the YAML document out of a model reply.
///
/// Markdown code fences are stripped. An empty reply or the `SOME_FAILURE`
/// token yields `StructuredOutput::Failure`.
#[must_use]
pub fn extract_yaml(raw: &str) -> StructuredOutput {
    let trimmed = raw.trim();

    let body = match trimmed.strip_prefix("```") {
        Some(fenced) => {
            // Drop the info string (`yaml`, `yml`, ...) on the opening fence.
            let after_info = fenced.split_once('\n').map_or("", |(_, rest)| rest);
            after_info
                .rsplit_once("```")
                .map_or(after_info, |(inner, _)| inner)
                .trim()
        }
        None => trimmed,
    };

    if body.is_empty() || body == SOME_FAILURE {
        StructuredOutput::Failure
    } else {
        StructuredOutput::Artifact(body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_call::testing::ScriptedBackend;

    #[test]
    fn extract_plain_yaml() {
        assert_eq!(
            extract_yaml("kind: Deployment\nmetadata:\n  name: nginx\n"),
            StructuredOutput::Artifact("kind: Deployment\nmetadata:\n  name: nginx".to_string())
        );
    }

    #[test]
    fn extract_fenced_yaml() {
        let raw = "```yaml\napiVersion: v1\nkind: Pod\n```\n";
        assert_eq!(
            extract_yaml(raw),
            StructuredOutput::Artifact("apiVersion: v1\nkind: Pod".to_string())
        );
    }

    #[test]
    fn extract_unterminated_fence() {
        let raw = "```\nkind: Service";
        assert_eq!(
            extract_yaml(raw),
            StructuredOutput::Artifact("kind: Service".to_string())
        );
    }

    #[test]
    fn failure_token_and_empty_reply() {
        assert_eq!(extract_yaml(" SOME_FAILURE \n"), StructuredOutput::Failure);
        assert_eq!(extract_yaml(""), StructuredOutput::Failure);
        assert_eq!(extract_yaml("```yaml\n```"), StructuredOutput::Failure);
    }

    #[tokio::test]
    async fn generator_includes_history() {
        let backend = Arc::new(ScriptedBackend::ok("kind: Deployment"));
        let generator = YamlGenerator::new(backend.clone());

        let output = generator
            .generate(
                &ConversationId::generate(),
                "Scale it to three replicas",
                Some("Generate a Deployment YAML for nginx\n\nkind: Deployment"),
            )
            .await
            .expect("generate");

        assert_eq!(output, StructuredOutput::Artifact("kind: Deployment".to_string()));
        let prompt = backend.last_prompt();
        assert!(prompt.contains("Generate a Deployment YAML for nginx"));
        assert!(prompt.contains("Scale it to three replicas"));
    }

    #[tokio::test]
    async fn generator_without_history_uses_placeholder() {
        let backend = Arc::new(ScriptedBackend::ok(SOME_FAILURE));
        let generator = YamlGenerator::new(backend.clone());

        let output = generator
            .generate(&ConversationId::generate(), "Make me lunch", None)
            .await
            .expect("generate");

        assert_eq!(output, StructuredOutput::Failure);
        assert!(backend.last_prompt().contains("(none)"));
    }

    #[tokio::test]
    async fn generator_applies_sampling_config() {
        let backend = Arc::new(ScriptedBackend::ok("kind: Pod"));
        let generator = YamlGenerator::new(backend.clone())
            .with_config(LlmCallConfig::default().with_max_tokens(2048));

        generator
            .generate(&ConversationId::generate(), "Generate a Pod", None)
            .await
            .expect("generate");

        assert_eq!(backend.requests.lock().unwrap()[0].max_tokens, Some(2048));
    }
}
