//! Query request and response shapes.

use helmsman_core::ConversationId;
use serde::{Deserialize, Serialize};

/// A question submitted to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Continues an existing conversation when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
}

impl QueryRequest {
    /// Creates a request that starts a new conversation.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            conversation_id: None,
        }
    }

    /// Continues the given conversation.
    #[must_use]
    pub fn in_conversation(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }
}

/// A successful answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub conversation_id: ConversationId,
    pub response: String,
}
