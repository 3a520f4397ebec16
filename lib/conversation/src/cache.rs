//! Conversation cache contract.
//!
//! A transcript is the text of every structured turn of one conversation,
//! oldest first, each turn separated from the next by a blank line.

use crate::error::CacheError;
use async_trait::async_trait;
use helmsman_core::ConversationId;

/// Separator placed between a query and its answer, and between turns.
pub const TURN_SEPARATOR: &str = "\n\n";

/// Formats one turn for appending to a transcript.
#[must_use]
pub fn format_turn(query: &str, answer: &str) -> String {
    format!("{query}{TURN_SEPARATOR}{answer}")
}

/// Keyed store mapping a conversation ID to its transcript.
///
/// Implementations must make `insert_or_append` atomic per key: two
/// concurrent appends to the same conversation both land, in some order,
/// and neither overwrites the other. A `get` issued after an
/// `insert_or_append` returned must observe the appended text, unless the
/// entry has since been evicted.
#[async_trait]
pub trait ConversationCache: Send + Sync {
    /// Returns the transcript for a conversation, or `None` if the
    /// conversation is unknown or has been evicted.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself failed.
    async fn get(&self, id: &ConversationId) -> Result<Option<String>, CacheError>;

    /// Creates the entry with `text`, or appends `text` to the existing
    /// transcript after a blank line.
    ///
    /// # Errors
    ///
    /// Returns an error if the store could not be written.
    async fn insert_or_append(&self, id: &ConversationId, text: &str) -> Result<(), CacheError>;
}

/// Cache used when conversation history is turned off.
///
/// Every lookup misses and every append is discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCache;

#[async_trait]
impl ConversationCache for DisabledCache {
    async fn get(&self, _id: &ConversationId) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn insert_or_append(&self, _id: &ConversationId, _text: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_is_query_blank_line_answer() {
        assert_eq!(
            format_turn("Generate a Deployment YAML for nginx", "kind: Deployment"),
            "Generate a Deployment YAML for nginx\n\nkind: Deployment"
        );
    }

    #[tokio::test]
    async fn disabled_cache_forgets_everything() {
        let cache = DisabledCache;
        let id = ConversationId::generate();

        cache.insert_or_append(&id, "hello").await.expect("append");
        assert_eq!(cache.get(&id).await.expect("get"), None);
    }
}
