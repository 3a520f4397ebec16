//! Shared application state.

use crate::config::ServerConfig;
use helmsman_ai::{
    BareCompletion, DocsSummarizer, LlmBackend, LlmError, OpenAiCompatibleBackend,
    QuestionValidator, YamlGenerator,
};
use helmsman_dispatch::{Dispatcher, DispatcherParts};
use std::sync::Arc;

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Wraps an already-built dispatcher.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Builds the model backend, answer strategies and conversation cache
    /// described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend configuration is invalid.
    pub fn from_config(config: &ServerConfig) -> Result<Self, LlmError> {
        let backend: Arc<dyn LlmBackend> =
            Arc::new(OpenAiCompatibleBackend::new(config.llm.clone())?);

        let sampling = &config.sampling;

        let dispatcher = Dispatcher::new(DispatcherParts {
            classifier: Arc::new(
                QuestionValidator::new(backend.clone()).with_config(sampling.classifier),
            ),
            summarizer: Arc::new(
                DocsSummarizer::new(backend.clone()).with_config(sampling.summarizer),
            ),
            generator: Arc::new(YamlGenerator::new(backend.clone()).with_config(sampling.generator)),
            completion: Arc::new(BareCompletion::new(backend).with_config(sampling.completion)),
            cache: config.conversation_cache.build(),
        });
        Ok(Self::new(dispatcher))
    }
}
