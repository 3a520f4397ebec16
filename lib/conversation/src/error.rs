//! Error types for the conversation crate.
//!
//! The dispatcher wraps these with its own context when a cache operation
//! fails, so they only describe what went wrong inside the store.

use std::fmt;

/// Errors from conversation cache operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The store could not be read.
    ReadFailed { reason: String },
    /// The store could not be written.
    WriteFailed { reason: String },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { reason } => {
                write!(f, "conversation cache read failed: {reason}")
            }
            Self::WriteFailed { reason } => {
                write!(f, "conversation cache write failed: {reason}")
            }
        }
    }
}

impl std::error::Error for CacheError {}
