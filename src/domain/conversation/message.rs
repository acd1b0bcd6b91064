//! Transcript messages.

use serde::{Deserialize, Serialize};

use super::handoff::HandoffReason;
use crate::domain::foundation::{MessageId, Timestamp};

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Wire name used by the completion endpoint and the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Lifecycle of a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Assistant placeholder still receiving deltas.
    Streaming,
    /// Frozen with its final content.
    Complete,
    /// Frozen with user-visible error text in place of an answer.
    Failed,
}

impl MessageStatus {
    /// Returns true once the message may no longer change.
    pub fn is_frozen(&self) -> bool {
        !matches!(self, Self::Streaming)
    }
}

/// One entry of the live transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: Timestamp,
    pub status: MessageStatus,
    /// Present only on synthetic "offer a human agent" entries, which carry
    /// no content of their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handoff: Option<HandoffReason>,
}

impl Message {
    /// Creates a finalized user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: MessageRole::User,
            content: content.into(),
            created_at: Timestamp::now(),
            status: MessageStatus::Complete,
            handoff: None,
        }
    }

    /// Creates an empty assistant placeholder that will receive deltas.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: MessageId::new(),
            role: MessageRole::Assistant,
            content: String::new(),
            created_at: Timestamp::now(),
            status: MessageStatus::Streaming,
            handoff: None,
        }
    }

    /// Creates a synthetic entry offering a path to a human agent.
    pub fn handoff_offer(reason: HandoffReason) -> Self {
        Self {
            id: MessageId::new(),
            role: MessageRole::Assistant,
            content: String::new(),
            created_at: Timestamp::now(),
            status: MessageStatus::Complete,
            handoff: Some(reason),
        }
    }

    /// Returns true for synthetic handoff offers.
    pub fn is_handoff_offer(&self) -> bool {
        self.handoff.is_some()
    }

    /// Returns true if this message belongs in the history sent upstream.
    pub fn is_conversational(&self) -> bool {
        self.status == MessageStatus::Complete
            && self.handoff.is_none()
            && !self.content.trim().is_empty()
    }
}
