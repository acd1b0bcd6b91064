//! AI Provider Port - Interface for the streaming completion endpoint.
//!
//! Abstracts the HTTP completion service so the session orchestrator can be
//! driven by a scripted provider in tests.
//!
//! # Design
//!
//! - One streaming request per user turn, carrying the full prior history
//!   plus out-of-band reference records
//! - Non-success statuses are classified into `AIError` variants that map
//!   onto user-visible `FailureKind`s
//! - No retries at this layer

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

use crate::domain::conversation::{FailureKind, MessageRole};
use crate::domain::foundation::{ConversationId, TurnId};

/// Stream of decoded chunks for one response.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, AIError>> + Send>>;

/// Port for completion provider interactions.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Opens a streaming completion.
    ///
    /// Resolves once response headers are accepted. Errors here mean no
    /// body was obtained.
    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError>;

    /// Get provider information.
    fn provider_info(&self) -> ProviderInfo;
}

/// Request for a streaming completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Prior turns plus the current user message.
    pub messages: Vec<ChatMessage>,
    /// The record the conversation is about.
    pub subject: Option<Value>,
    /// Caller preferences.
    pub preferences: Option<Value>,
    /// Request metadata for tracing.
    pub metadata: RequestMetadata,
}

impl CompletionRequest {
    /// Creates an empty request with the given metadata.
    pub fn new(metadata: RequestMetadata) -> Self {
        Self {
            messages: Vec::new(),
            subject: None,
            preferences: None,
            metadata,
        }
    }

    /// Adds a message to the history.
    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
        });
        self
    }

    /// Sets the subject record.
    pub fn with_subject(mut self, subject: Option<Value>) -> Self {
        self.subject = subject;
        self
    }

    /// Sets the caller preferences.
    pub fn with_preferences(mut self, preferences: Option<Value>) -> Self {
        self.preferences = preferences;
        self
    }

    /// Content of the last user message, if any.
    pub fn latest_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// A role/content pair sent upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Request metadata for tracing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    /// Persisted conversation, if one exists yet.
    pub conversation_id: Option<ConversationId>,
    /// The turn this request belongs to.
    pub turn: TurnId,
}

impl RequestMetadata {
    pub fn new(conversation_id: Option<ConversationId>, turn: TurnId) -> Self {
        Self {
            conversation_id,
            turn,
        }
    }
}

/// Why a response stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The terminator sentinel was received.
    Done,
    /// The body closed without a terminator.
    Closed,
}

/// Streaming chunk from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    /// New content in this chunk.
    pub delta: String,
    /// If present, the stream is complete.
    pub finish_reason: Option<FinishReason>,
}

impl StreamChunk {
    /// Creates a content chunk.
    pub fn content(delta: impl Into<String>) -> Self {
        Self {
            delta: delta.into(),
            finish_reason: None,
        }
    }

    /// Creates the final chunk.
    pub fn finished(reason: FinishReason) -> Self {
        Self {
            delta: String::new(),
            finish_reason: Some(reason),
        }
    }

    /// Returns true if this is the final chunk.
    pub fn is_final(&self) -> bool {
        self.finish_reason.is_some()
    }
}

/// Provider information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "openai-compatible").
    pub name: String,
    /// Model identifier, if the endpoint takes one.
    pub model: Option<String>,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: Option<String>) -> Self {
        Self {
            name: name.into(),
            model,
        }
    }
}

/// AI provider errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AIError {
    /// Upstream answered 429.
    #[error("rate limited")]
    RateLimited,

    /// Upstream answered 402.
    #[error("usage quota exhausted")]
    QuotaExhausted,

    /// Upstream answered 5xx.
    #[error("provider unavailable ({status}): {message}")]
    Unavailable {
        status: u16,
        message: String,
    },

    /// Any other non-success status.
    #[error("unexpected status {status}: {message}")]
    Status {
        status: u16,
        message: String,
    },

    /// Connection failed or the body broke off.
    #[error("network error: {0}")]
    Network(String),

    /// Request could not be encoded.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AIError {
    /// Classifies a non-success status and its body.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        match FailureKind::from_status(status) {
            FailureKind::RateLimited => Self::RateLimited,
            FailureKind::QuotaExhausted => Self::QuotaExhausted,
            FailureKind::Unavailable => Self::Unavailable { status, message },
            _ => Self::Status { status, message },
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// The user-visible failure class for this error.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::RateLimited => FailureKind::RateLimited,
            Self::QuotaExhausted => FailureKind::QuotaExhausted,
            Self::Unavailable { .. } => FailureKind::Unavailable,
            Self::Network(_) => FailureKind::Transport,
            Self::Status { .. } | Self::InvalidRequest(_) => FailureKind::Generic,
        }
    }
}
