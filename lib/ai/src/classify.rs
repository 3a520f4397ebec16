//! Question classification.
//!
//! Decides whether a question is in the supported domain and, if so, which
//! response strategy should answer it.

use crate::backend::LlmBackend;
use crate::error::AiError;
use crate::llm_call::{LlmCall, LlmCallConfig};
use crate::prompt::{self, PromptTemplate};
use async_trait::async_trait;
use helmsman_core::ConversationId;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Verdict token for an in-domain question.
pub const VALID: &str = "VALID";
/// Verdict token for an out-of-domain question.
pub const INVALID: &str = "INVALID";
/// Subtype token for a question that wants prose.
pub const NOYAML: &str = "NOYAML";
/// Subtype token for a question that wants a manifest.
pub const YAML: &str = "YAML";

/// The response strategy an in-domain question needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Free-form explanatory answer.
    FreeForm,
    /// Structured configuration (YAML) generation.
    Structured,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FreeForm => write!(f, "free_form"),
            Self::Structured => write!(f, "structured"),
        }
    }
}

/// Outcome of classifying a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The question is outside the supported subject area.
    OutOfDomain,
    /// The question is in-domain and needs the given strategy.
    InDomain(QuestionKind),
    /// The classifier produced something outside the known vocabulary.
    Unrecognized(String),
}

impl Classification {
    /// Parses a classifier verdict of the form `VERDICT[,SUBTYPE]`.
    ///
    /// Tokens are trimmed and compared case-insensitively. Anything that is
    /// not a known verdict or subtype becomes `Unrecognized` carrying the
    /// offending text, never a guess.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let line = raw.trim().lines().next().unwrap_or_default().trim();
        let mut parts = line.splitn(2, ',').map(str::trim);
        let verdict = parts.next().unwrap_or_default();
        let subtype = parts.next().unwrap_or_default();

        if verdict.eq_ignore_ascii_case(INVALID) {
            return Self::OutOfDomain;
        }
        if !verdict.eq_ignore_ascii_case(VALID) {
            return Self::Unrecognized(line.to_string());
        }

        if subtype.eq_ignore_ascii_case(NOYAML) {
            Self::InDomain(QuestionKind::FreeForm)
        } else if subtype.eq_ignore_ascii_case(YAML) {
            Self::InDomain(QuestionKind::Structured)
        } else {
            Self::Unrecognized(subtype.to_string())
        }
    }
}

/// Labels a question as out-of-domain or in-domain with a strategy.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classifies a question.
    ///
    /// # Errors
    ///
    /// Returns an error if the classifier could not run at all. A
    /// nonsensical verdict is not an error; it is `Unrecognized`.
    async fn classify(
        &self,
        conversation_id: &ConversationId,
        query: &str,
    ) -> Result<Classification, Report<AiError>>;
}

/// LLM-backed classifier.
pub struct QuestionValidator {
    backend: Arc<dyn LlmBackend>,
    template: PromptTemplate,
    config: LlmCallConfig,
}

impl QuestionValidator {
    /// Creates a validator using the default prompt.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            template: prompt::question_validator(),
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
impl Classifier for QuestionValidator {
    #[instrument(skip_all, fields(conversation_id = %conversation_id))]
    async fn classify(
        &self,
        conversation_id: &ConversationId,
        query: &str,
    ) -> Result<Classification, Report<AiError>> {
        let call = LlmCall::from_template(&self.template, &HashMap::from([("query", query)]))?
            .with_config(self.config);
        let result = call.execute(self.backend.as_ref()).await?;

        let classification = Classification::parse(&result.content);
        debug!(raw = %result.content.trim(), ?classification, "question classified");
        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm_call::testing::ScriptedBackend;

    #[test]
    fn parse_out_of_domain() {
        assert_eq!(Classification::parse("INVALID,NOYAML"), Classification::OutOfDomain);
        assert_eq!(Classification::parse("INVALID"), Classification::OutOfDomain);
    }

    #[test]
    fn parse_in_domain() {
        assert_eq!(
            Classification::parse("VALID,NOYAML"),
            Classification::InDomain(QuestionKind::FreeForm)
        );
        assert_eq!(
            Classification::parse(" valid , yaml \n"),
            Classification::InDomain(QuestionKind::Structured)
        );
    }

    #[test]
    fn parse_unknown_subtype() {
        assert_eq!(
            Classification::parse("VALID,foo"),
            Classification::Unrecognized("foo".to_string())
        );
        assert_eq!(
            Classification::parse("VALID"),
            Classification::Unrecognized(String::new())
        );
    }

    #[test]
    fn parse_unknown_verdict() {
        assert_eq!(
            Classification::parse("MAYBE,YAML"),
            Classification::Unrecognized("MAYBE,YAML".to_string())
        );
    }

    #[test]
    fn parse_ignores_trailing_explanation() {
        assert_eq!(
            Classification::parse("VALID,YAML\nBecause it asks for a manifest."),
            Classification::InDomain(QuestionKind::Structured)
        );
    }

    #[tokio::test]
    async fn validator_sends_query_to_backend() {
        let backend = Arc::new(ScriptedBackend::ok("VALID,NOYAML"));
        let validator = QuestionValidator::new(backend.clone());

        let classification = validator
            .classify(&ConversationId::generate(), "What is a Pod?")
            .await
            .expect("classify");

        assert_eq!(classification, Classification::InDomain(QuestionKind::FreeForm));
        assert!(backend.last_prompt().contains("What is a Pod?"));
    }

    #[tokio::test]
    async fn validator_propagates_backend_failure() {
        let backend = Arc::new(ScriptedBackend::replying([Err(LlmError::Timeout)]));
        let validator = QuestionValidator::new(backend);

        let err = validator
            .classify(&ConversationId::generate(), "What is a Pod?")
            .await
            .unwrap_err();

        assert!(matches!(err.current_context(), AiError::LlmCall { .. }));
    }

    #[tokio::test]
    async fn validator_applies_sampling_config() {
        let backend = Arc::new(ScriptedBackend::ok("VALID,YAML"));
        let validator = QuestionValidator::new(backend.clone())
            .with_config(LlmCallConfig::default().with_temperature(0.0));

        validator
            .classify(&ConversationId::generate(), "Generate a Deployment")
            .await
            .expect("classify");

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[0].temperature, Some(0.0));
        assert_eq!(requests[0].max_tokens, None);
    }
}
