//! Conversation cache configuration.

use crate::cache::{ConversationCache, DisabledCache};
use crate::memory::InMemoryCache;
use serde::Deserialize;
use std::sync::Arc;

/// Which cache implementation to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    /// Bounded in-process cache.
    #[default]
    Memory,
    /// History is not kept.
    Disabled,
}

/// Conversation cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "type", default)]
    pub kind: CacheKind,
    /// Maximum conversations kept by the memory cache. Zero means unbounded.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    1000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kind: CacheKind::default(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheConfig {
    /// Builds the configured cache.
    #[must_use]
    pub fn build(&self) -> Arc<dyn ConversationCache> {
        match self.kind {
            CacheKind::Memory => Arc::new(InMemoryCache::new(self.max_entries)),
            CacheKind::Disabled => Arc::new(DisabledCache),
        }
    }
}
