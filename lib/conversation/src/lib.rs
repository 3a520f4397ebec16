//! Conversation state for the helmsman query dispatcher.
//!
//! This crate provides:
//!
//! - **Conversation Cache**: the transcript store contract the dispatcher
//!   relies on
//! - **In-memory cache**: bounded, least-recently-used store
//! - **Disabled cache**: no-op store for deployments without history

pub mod cache;
pub mod config;
pub mod error;
pub mod memory;

pub use cache::{ConversationCache, DisabledCache, TURN_SEPARATOR, format_turn};
pub use config::{CacheConfig, CacheKind};
pub use error::CacheError;
pub use memory::InMemoryCache;
