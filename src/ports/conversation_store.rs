//! Conversation store port (append-only persistence gateway).
//!
//! The store is the system of record; the session's in-memory transcript is
//! always the more current value. Writes happen at two points per turn: the
//! user message immediately, the assistant message only once finalized.
//!
//! Implementations must tolerate a caller that crashes right after a call
//! returns, i.e. both operations are safe to repeat.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::conversation::{ConversationSeed, MessageRole};
use crate::domain::foundation::ConversationId;

/// Store errors. Never fatal to a turn; the session logs and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Port for conversation persistence.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Creates a conversation from its initial context and returns its id.
    async fn create_conversation(&self, seed: &ConversationSeed)
        -> Result<ConversationId, StoreError>;

    /// Appends one message to a conversation.
    ///
    /// `metadata` is a JSON object; `Value::Null` when there is nothing to add.
    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        role: MessageRole,
        content: &str,
        metadata: &Value,
    ) -> Result<(), StoreError>;
}
