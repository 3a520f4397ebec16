//! In-process conversation cache.

use crate::cache::{ConversationCache, TURN_SEPARATOR};
use crate::error::CacheError;
use async_trait::async_trait;
use helmsman_core::ConversationId;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Bounded in-memory cache with least-recently-used eviction.
///
/// Both reads and writes refresh an entry's recency. When a new
/// conversation would push the cache past `max_entries`, the entry that
/// was touched longest ago is dropped. A `max_entries` of zero disables
/// eviction.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: Mutex<LruCache<ConversationId, String>>,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl InMemoryCache {
    /// Creates a cache holding at most `max_entries` conversations.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        let entries =
            NonZeroUsize::new(max_entries).map_or_else(LruCache::unbounded, LruCache::new);
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Creates a cache without an entry limit.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Returns the number of conversations held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Returns whether the cache holds no conversations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
        on_error: fn(String) -> CacheError,
    ) -> Result<MutexGuard<'_, LruCache<ConversationId, String>>, CacheError> {
        self.entries.lock().map_err(|e| on_error(e.to_string()))
    }
}

#[async_trait]
impl ConversationCache for InMemoryCache {
    async fn get(&self, id: &ConversationId) -> Result<Option<String>, CacheError> {
        let mut entries = self.lock(|reason| CacheError::ReadFailed { reason })?;
        Ok(entries.get(id).cloned())
    }

    async fn insert_or_append(&self, id: &ConversationId, text: &str) -> Result<(), CacheError> {
        let mut entries = self.lock(|reason| CacheError::WriteFailed { reason })?;

        if let Some(transcript) = entries.get_mut(id) {
            transcript.push_str(TURN_SEPARATOR);
            transcript.push_str(text);
            return Ok(());
        }

        // The key is absent, so anything `push` hands back was evicted.
        if let Some((evicted, _)) = entries.push(id.clone(), text.to_string()) {
            debug!(conversation_id = %evicted, "evicted conversation from cache");
        }
        Ok(())
    }
}
