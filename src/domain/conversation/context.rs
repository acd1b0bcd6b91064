//! Session context threaded into the orchestrator at construction.
//!
//! Nothing here is read from ambient state: every session gets its caller
//! identity and reference records explicitly, which keeps the engine
//! instantiable per test with deterministic inputs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{Timestamp, UserId};

/// Inputs fixed for the lifetime of one chat session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    /// Caller identity, once known. Anonymous sessions are never persisted.
    pub caller: Option<UserId>,
    /// The record the conversation is about (a listing, typically).
    pub subject: Option<Value>,
    /// Caller preferences forwarded with every completion request.
    pub preferences: Option<Value>,
}

impl SessionContext {
    /// Creates an anonymous context with no reference data.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Creates a context for a known caller.
    pub fn for_caller(caller: UserId) -> Self {
        Self {
            caller: Some(caller),
            ..Self::default()
        }
    }

    /// Attaches the subject record.
    pub fn with_subject(mut self, subject: Value) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Attaches caller preferences.
    pub fn with_preferences(mut self, preferences: Value) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Returns true if conversations for this session can be persisted.
    pub fn is_identified(&self) -> bool {
        self.caller.is_some()
    }

    /// Captures the immutable snapshot stored alongside a new conversation.
    ///
    /// Returns `None` for anonymous sessions.
    pub fn seed(&self) -> Option<ConversationSeed> {
        self.caller.as_ref().map(|caller| ConversationSeed {
            caller: caller.clone(),
            subject: self.subject.clone(),
            preferences: self.preferences.clone(),
            created_at: Timestamp::now(),
        })
    }
}

/// Initial context handed to the store when a conversation is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSeed {
    pub caller: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Value>,
    pub created_at: Timestamp,
}
