//! The query dispatcher.
//!
//! One call to [`Dispatcher::handle`] runs this sequence:
//!
//! 1. Resolve the conversation ID, generating one if the caller sent none.
//! 2. Classify the query.
//! 3. Route it: reject out-of-domain questions, answer free-form questions
//!    with the summarizer, and answer structured questions with the
//!    generator using the prior transcript as context.
//! 4. After a successful structured answer, append the turn to the
//!    conversation transcript.
//!
//! The transcript is read only on the structured path, since no other
//! route uses it. That keeps rejected and free-form requests from touching
//! the cache at all, and still performs at most one read and one write per
//! request.

use crate::error::{CacheOperation, DispatchError, Stage};
use crate::request::{QueryRequest, QueryResponse};
use helmsman_ai::{
    Classification, Classifier, Completion, FreeFormGenerator, QuestionKind, StructuredGenerator,
    StructuredOutput,
};
use helmsman_conversation::{ConversationCache, format_turn};
use helmsman_core::ConversationId;
use rootcause::prelude::{Report, ResultExt};
use std::sync::Arc;
use tracing::{Span, debug, error, field, info, instrument};

/// Collaborators a [`Dispatcher`] is built from.
pub struct DispatcherParts {
    pub classifier: Arc<dyn Classifier>,
    pub summarizer: Arc<dyn FreeFormGenerator>,
    pub generator: Arc<dyn StructuredGenerator>,
    pub completion: Arc<dyn Completion>,
    pub cache: Arc<dyn ConversationCache>,
}

/// Routes queries to generation strategies and keeps conversation state.
///
/// The dispatcher holds no per-request state. Concurrent requests for the
/// same conversation are not serialized here; the cache's atomic append
/// keeps their transcript writes from clobbering each other.
pub struct Dispatcher {
    classifier: Arc<dyn Classifier>,
    summarizer: Arc<dyn FreeFormGenerator>,
    generator: Arc<dyn StructuredGenerator>,
    completion: Arc<dyn Completion>,
    cache: Arc<dyn ConversationCache>,
}

impl Dispatcher {
    /// Creates a dispatcher from its collaborators.
    #[must_use]
    pub fn new(parts: DispatcherParts) -> Self {
        let DispatcherParts {
            classifier,
            summarizer,
            generator,
            completion,
            cache,
        } = parts;
        Self {
            classifier,
            summarizer,
            generator,
            completion,
            cache,
        }
    }

    /// Answers a query.
    ///
    /// # Errors
    ///
    /// Returns `EmptyQuery` or `OutOfDomain` when the caller is at fault.
    /// Any other `DispatchError` is a server failure.
    #[instrument(skip_all, fields(conversation_id = field::Empty))]
    pub async fn handle(
        &self,
        request: QueryRequest,
    ) -> Result<QueryResponse, Report<DispatchError>> {
        let QueryRequest {
            query,
            conversation_id,
        } = request;
        if query.trim().is_empty() {
            return Err(DispatchError::EmptyQuery.into());
        }

        let (conversation_id, continuing) = resolve_conversation(conversation_id);
        info!(continuing, query = %query, "incoming request");

        let classification = self
            .classifier
            .classify(&conversation_id, &query)
            .await
            .context(DispatchError::UpstreamCall {
                stage: Stage::Classify,
            })?;

        let response = match classification {
            Classification::OutOfDomain => {
                info!("question is out of domain, rejecting");
                return Err(DispatchError::OutOfDomain.into());
            }
            Classification::Unrecognized(raw) => {
                error!(raw = %raw, "classifier returned an unrecognized question type");
                return Err(DispatchError::UnrecognizedClassification { raw }.into());
            }
            Classification::InDomain(QuestionKind::FreeForm) => {
                self.answer_free_form(&conversation_id, &query).await?
            }
            Classification::InDomain(QuestionKind::Structured) => {
                self.answer_structured(&conversation_id, &query, continuing)
                    .await?
            }
        };

        Ok(QueryResponse {
            query,
            conversation_id,
            response,
        })
    }

    /// Sends a query straight to the model.
    ///
    /// No classification happens and the conversation cache is neither
    /// read nor written. The conversation ID is resolved the same way as
    /// in [`Dispatcher::handle`] and echoed back.
    ///
    /// # Errors
    ///
    /// Returns `EmptyQuery` for a blank query and `UpstreamCall` if the
    /// model call fails.
    #[instrument(skip_all, fields(conversation_id = field::Empty))]
    pub async fn handle_raw(
        &self,
        request: QueryRequest,
    ) -> Result<QueryResponse, Report<DispatchError>> {
        let QueryRequest {
            query,
            conversation_id,
        } = request;
        if query.trim().is_empty() {
            return Err(DispatchError::EmptyQuery.into());
        }

        let (conversation_id, _) = resolve_conversation(conversation_id);
        info!(query = %query, "incoming raw request");

        let response = self
            .completion
            .complete(&query)
            .await
            .context(DispatchError::UpstreamCall {
                stage: Stage::Complete,
            })?;
        info!(response = %response, "model returned");

        Ok(QueryResponse {
            query,
            conversation_id,
            response,
        })
    }

    async fn answer_free_form(
        &self,
        conversation_id: &ConversationId,
        query: &str,
    ) -> Result<String, Report<DispatchError>> {
        debug!("question is free-form, sending to the summarizer");
        let (text, metadata) = self
            .summarizer
            .summarize(conversation_id, query)
            .await
            .context(DispatchError::UpstreamCall {
                stage: Stage::Summarize,
            })?;
        debug!(
            invocation_id = %metadata.invocation_id,
            model = %metadata.model,
            latency_ms = metadata.latency_ms,
            "summary produced"
        );
        Ok(text)
    }

    async fn answer_structured(
        &self,
        conversation_id: &ConversationId,
        query: &str,
        continuing: bool,
    ) -> Result<String, Report<DispatchError>> {
        debug!("question is structured, sending to the generator");

        let history = if continuing {
            self.cache
                .get(conversation_id)
                .await
                .context(DispatchError::Cache {
                    operation: CacheOperation::Read,
                })?
        } else {
            None
        };
        debug!(has_history = history.is_some(), "prior transcript resolved");

        let output = self
            .generator
            .generate(conversation_id, query, history.as_deref())
            .await
            .context(DispatchError::UpstreamCall {
                stage: Stage::Generate,
            })?;

        let artifact = match output {
            StructuredOutput::Artifact(artifact) => artifact,
            StructuredOutput::Failure => {
                error!("structured generator returned its failure sentinel");
                return Err(DispatchError::GenerationFailure.into());
            }
        };

        self.cache
            .insert_or_append(conversation_id, &format_turn(query, &artifact))
            .await
            .context(DispatchError::Cache {
                operation: CacheOperation::Write,
            })?;

        Ok(artifact)
    }
}

/// Returns the conversation ID to use and whether it continues an
/// existing conversation, and records it on the current span.
fn resolve_conversation(conversation_id: Option<ConversationId>) -> (ConversationId, bool) {
    let (conversation_id, continuing) = match conversation_id {
        Some(id) => (id, true),
        None => (ConversationId::generate(), false),
    };
    Span::current().record("conversation_id", field::display(&conversation_id));
    (conversation_id, continuing)
}
