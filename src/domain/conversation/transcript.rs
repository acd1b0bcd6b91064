//! The live transcript and its assembly rules.

use thiserror::Error;

use super::handoff::HandoffReason;
use super::message::{Message, MessageRole, MessageStatus};
use crate::domain::foundation::MessageId;

/// Errors raised when an edit would break the transcript invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("An assistant message is already streaming: {0}")]
    TurnAlreadyOpen(MessageId),

    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("Message is finalized and cannot change: {0}")]
    MessageFrozen(MessageId),
}

/// Ordered, append-only sequence of messages for one conversation.
///
/// At most one assistant message is open for deltas at any time; every other
/// message is frozen. Each edit leaves the transcript fully consistent, so a
/// snapshot taken between calls never shows a half-applied change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
    in_flight: Option<MessageId>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finalized user message and returns a copy of it.
    pub fn append_user(&mut self, text: impl Into<String>) -> Message {
        let message = Message::user(text);
        self.messages.push(message.clone());
        message
    }

    /// Opens an empty assistant placeholder and returns its id.
    pub fn begin_assistant_turn(&mut self) -> Result<MessageId, TranscriptError> {
        if let Some(open) = self.in_flight {
            return Err(TranscriptError::TurnAlreadyOpen(open));
        }
        let message = Message::assistant_placeholder();
        let id = message.id;
        self.messages.push(message);
        self.in_flight = Some(id);
        Ok(id)
    }

    /// Appends a fragment to the open assistant message.
    ///
    /// Fragments are concatenated strictly in call order. An empty fragment
    /// is a no-op.
    pub fn apply_delta(&mut self, id: MessageId, fragment: &str) -> Result<(), TranscriptError> {
        let message = self.open_message_mut(id)?;
        if !fragment.is_empty() {
            message.content.push_str(fragment);
        }
        Ok(())
    }

    /// Freezes the open assistant message and returns its final state.
    pub fn finalize(&mut self, id: MessageId) -> Result<Message, TranscriptError> {
        let message = self.open_message_mut(id)?;
        message.status = MessageStatus::Complete;
        let finalized = message.clone();
        self.in_flight = None;
        Ok(finalized)
    }

    /// Replaces the open assistant message's content with error text and
    /// freezes it.
    pub fn fail(&mut self, id: MessageId, error_text: &str) -> Result<Message, TranscriptError> {
        let message = self.open_message_mut(id)?;
        message.content = error_text.to_string();
        message.status = MessageStatus::Failed;
        let failed = message.clone();
        self.in_flight = None;
        Ok(failed)
    }

    /// Appends a synthetic handoff offer. Never edits earlier messages.
    pub fn append_handoff_offer(&mut self, reason: HandoffReason) -> Message {
        let message = Message::handoff_offer(reason);
        self.messages.push(message.clone());
        message
    }

    /// Role/content pairs of finished conversational messages, in order.
    pub fn history(&self) -> Vec<(MessageRole, String)> {
        self.messages
            .iter()
            .filter(|m| m.is_conversational())
            .map(|m| (m.role, m.content.clone()))
            .collect()
    }

    /// Id of the assistant message currently receiving deltas.
    pub fn in_flight(&self) -> Option<MessageId> {
        self.in_flight
    }

    /// Looks up a message by id.
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// All messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn open_message_mut(&mut self, id: MessageId) -> Result<&mut Message, TranscriptError> {
        let message = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.id == id)
            .ok_or(TranscriptError::MessageNotFound(id))?;
        if message.status.is_frozen() {
            return Err(TranscriptError::MessageFrozen(id));
        }
        Ok(message)
    }
}
