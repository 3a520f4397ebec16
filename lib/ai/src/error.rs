//! Error types for the AI crate.
//!
//! `LlmError` and `PromptError` are root causes. Strategies wrap them in an
//! `AiError` context so a failed call can be traced to its invocation.

use crate::llm_call::LlmInvocationId;
use std::fmt;

/// Errors from LLM backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Could not connect to the provider.
    ProviderUnavailable { provider: String, reason: String },
    /// The request could not be sent.
    RequestFailed { reason: String },
    /// Provider answered with a non-success status.
    ErrorStatus { status: u16, body: String },
    /// The body was not a chat completion.
    ResponseParseFailed { reason: String },
    /// The configured request timeout elapsed.
    Timeout,
    /// HTTP 429, with the `Retry-After` value when one was sent.
    RateLimited { retry_after_secs: Option<u64> },
    /// The backend cannot be built from its configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "LLM provider '{provider}' unavailable: {reason}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "LLM request failed: {reason}")
            }
            Self::ErrorStatus { status, body } => {
                write!(f, "LLM provider returned status {status}: {body}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::Timeout => write!(f, "LLM request timed out"),
            Self::RateLimited {
                retry_after_secs: Some(secs),
            } => write!(f, "LLM provider rate limited the request, retry after {secs}s"),
            Self::RateLimited {
                retry_after_secs: None,
            } => write!(f, "LLM provider rate limited the request"),
            Self::InvalidConfig { reason } => {
                write!(f, "invalid LLM configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Errors from rendering a prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    /// A required variable was neither supplied nor defaulted.
    MissingVariable {
        template: String,
        variable: String,
        description: String,
    },
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVariable {
                template,
                variable,
                description,
            } => {
                write!(
                    f,
                    "missing required variable '{variable}' ({description}) in template '{template}'"
                )
            }
        }
    }
}

impl std::error::Error for PromptError {}

/// Context added by the strategies around a failed backend call or render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    LlmCall { invocation_id: LlmInvocationId },
    PromptRender { template: String },
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LlmCall { invocation_id } => {
                write!(f, "LLM call {invocation_id} failed")
            }
            Self::PromptRender { template } => {
                write!(f, "failed to render prompt '{template}'")
            }
        }
    }
}

impl std::error::Error for AiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_error_display() {
        let err = LlmError::ProviderUnavailable {
            provider: "ollama".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("ollama"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn error_status_display() {
        let err = LlmError::ErrorStatus {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "LLM provider returned status 503: overloaded"
        );
    }

    #[test]
    fn rate_limited_display() {
        let err = LlmError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert!(err.to_string().ends_with("retry after 30s"));
        let err = LlmError::RateLimited {
            retry_after_secs: None,
        };
        assert_eq!(err.to_string(), "LLM provider rate limited the request");
    }

    #[test]
    fn prompt_error_display() {
        let err = PromptError::MissingVariable {
            template: "question_validator".to_string(),
            variable: "query".to_string(),
            description: "The user's question".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "missing required variable 'query' (The user's question) in template 'question_validator'"
        );
    }

    #[test]
    fn ai_error_display() {
        let id = LlmInvocationId::new();
        let err = AiError::LlmCall { invocation_id: id };
        assert!(err.to_string().starts_with("LLM call llm_"));
    }
}
