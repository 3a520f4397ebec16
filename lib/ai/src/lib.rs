//! AI primitives for the helmsman query dispatcher.
//!
//! This crate provides the LLM plumbing and the strategies built on it:
//!
//! - **Backend**: the `LlmBackend` trait and an OpenAI-compatible HTTP client
//! - **LLM Call**: single-shot inference from a rendered prompt template
//! - **Strategies**: question classification, free-form answers, YAML
//!   generation and bare completion, each behind its own trait so the
//!   dispatcher can be wired with fakes.

pub mod backend;
pub mod classify;
pub mod completion;
pub mod error;
pub mod llm_call;
pub mod openai;
pub mod prompt;
pub mod summarize;
pub mod yaml;

pub use backend::{LlmBackend, LlmBackendConfig, LlmProvider, LlmRequest, LlmResponse, TokenUsage};
pub use classify::{Classification, Classifier, QuestionKind, QuestionValidator};
pub use completion::{BareCompletion, Completion};
pub use error::{AiError, LlmError, PromptError};
pub use llm_call::{LlmCall, LlmCallConfig, LlmCallResult, LlmInvocationId};
pub use openai::OpenAiCompatibleBackend;
pub use summarize::{DocsSummarizer, FreeFormGenerator, SummaryMetadata};
pub use yaml::{SOME_FAILURE, StructuredGenerator, StructuredOutput, YamlGenerator};
