//! Core domain types and utilities for the helmsman query dispatcher.
//!
//! This crate provides the foundational identifier types and error handling
//! shared by the AI, conversation, dispatch and server crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ConversationId, ParseIdError};
