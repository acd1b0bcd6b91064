//! In-Memory Conversation Store Adapter
//!
//! Keeps conversations and their appended messages in memory.
//! Useful for testing, development and the demo binary.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::{ConversationSeed, MessageRole};
use crate::domain::foundation::ConversationId;
use crate::ports::{ConversationStore, StoreError};

/// A message as recorded by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    pub metadata: Value,
}

/// In-memory conversation store with failure injection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    conversations: Arc<RwLock<HashMap<ConversationId, ConversationSeed>>>,
    messages: Arc<RwLock<Vec<StoredMessage>>>,
    fail_creates: Arc<AtomicBool>,
    fail_appends: Arc<AtomicBool>,
}

impl InMemoryConversationStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `create_conversation` call fail until reset
    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Make every `append_message` call fail until reset
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Number of conversations created
    pub async fn conversation_count(&self) -> usize {
        self.conversations.read().await.len()
    }

    /// Seed a conversation was created with
    pub async fn seed(&self, id: &ConversationId) -> Option<ConversationSeed> {
        self.conversations.read().await.get(id).cloned()
    }

    /// All appended messages, in write order
    pub async fn messages(&self) -> Vec<StoredMessage> {
        self.messages.read().await.clone()
    }

    /// Appended messages with the given role
    pub async fn messages_with_role(&self, role: MessageRole) -> Vec<StoredMessage> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|m| m.role == role)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(
        &self,
        seed: &ConversationSeed,
    ) -> Result<ConversationId, StoreError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("create rejected".to_string()));
        }
        let id = ConversationId::new();
        self.conversations.write().await.insert(id, seed.clone());
        Ok(id)
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        role: MessageRole,
        content: &str,
        metadata: &Value,
    ) -> Result<(), StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("append rejected".to_string()));
        }
        if !self.conversations.read().await.contains_key(conversation_id) {
            return Err(StoreError::ConversationNotFound(*conversation_id));
        }
        self.messages.write().await.push(StoredMessage {
            conversation_id: *conversation_id,
            role,
            content: content.to_string(),
            metadata: metadata.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::SessionContext;
    use crate::domain::foundation::UserId;
    use serde_json::json;

    fn seed() -> ConversationSeed {
        SessionContext::for_caller(UserId::new("buyer-1").unwrap())
            .with_subject(json!({"id": "listing-3"}))
            .seed()
            .unwrap()
    }

    #[tokio::test]
    async fn creates_and_appends() {
        let store = InMemoryConversationStore::new();
        let id = store.create_conversation(&seed()).await.unwrap();

        store
            .append_message(&id, MessageRole::User, "hello", &Value::Null)
            .await
            .unwrap();

        assert_eq!(store.conversation_count().await, 1);
        assert_eq!(store.seed(&id).await.unwrap().subject, Some(json!({"id": "listing-3"})));
        let messages = store.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello");
    }

    #[tokio::test]
    async fn append_to_unknown_conversation_fails() {
        let store = InMemoryConversationStore::new();
        let stranger = ConversationId::new();
        let result = store
            .append_message(&stranger, MessageRole::User, "hi", &Value::Null)
            .await;
        assert_eq!(result, Err(StoreError::ConversationNotFound(stranger)));
    }

    #[tokio::test]
    async fn injected_failures_are_reported() {
        let store = InMemoryConversationStore::new();
        store.set_fail_creates(true);
        assert!(store.create_conversation(&seed()).await.is_err());

        store.set_fail_creates(false);
        let id = store.create_conversation(&seed()).await.unwrap();
        store.set_fail_appends(true);
        assert!(store
            .append_message(&id, MessageRole::Assistant, "x", &Value::Null)
            .await
            .is_err());
        assert!(store.messages().await.is_empty());
    }
}
