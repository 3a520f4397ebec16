//! Error types for query dispatch.

use std::fmt;

/// Message returned for questions outside the supported subject area.
pub const OUT_OF_DOMAIN_MESSAGE: &str = "Sorry, I can only answer questions about OpenShift and \
     Kubernetes. This does not look like something I know how to handle.";

/// Message returned for every server-side failure.
pub const SERVER_FAILURE_MESSAGE: &str = "Internal server error. Please try again.";

/// Message returned when the query is blank.
pub const EMPTY_QUERY_MESSAGE: &str = "The query must not be empty.";

/// Collaborator that was running when an upstream call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classify,
    Summarize,
    Generate,
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Classify => "classify",
            Self::Summarize => "summarize",
            Self::Generate => "generate",
            Self::Complete => "complete",
        })
    }
}

/// Cache operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOperation {
    Read,
    Write,
}

impl fmt::Display for CacheOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// Errors from dispatching a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The query was empty or whitespace.
    EmptyQuery,
    /// The question is outside the supported subject area.
    OutOfDomain,
    /// The classifier answered with a value outside its contract.
    UnrecognizedClassification { raw: String },
    /// The structured generator returned its failure sentinel.
    GenerationFailure,
    /// A collaborator call failed.
    UpstreamCall { stage: Stage },
    /// The conversation cache failed.
    Cache { operation: CacheOperation },
}

impl DispatchError {
    /// Returns whether the caller is at fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyQuery | Self::OutOfDomain)
    }

    /// Returns the message safe to show the caller.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyQuery => EMPTY_QUERY_MESSAGE,
            Self::OutOfDomain => OUT_OF_DOMAIN_MESSAGE,
            Self::UnrecognizedClassification { .. }
            | Self::GenerationFailure
            | Self::UpstreamCall { .. }
            | Self::Cache { .. } => SERVER_FAILURE_MESSAGE,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyQuery => write!(f, "query is empty"),
            Self::OutOfDomain => write!(f, "question is out of domain"),
            Self::UnrecognizedClassification { raw } => {
                write!(f, "unrecognized classification: {raw:?}")
            }
            Self::GenerationFailure => write!(f, "structured generation failed"),
            Self::UpstreamCall { stage } => write!(f, "upstream {stage} call failed"),
            Self::Cache { operation } => write!(f, "conversation cache {operation} failed"),
        }
    }
}

impl std::error::Error for DispatchError {}
