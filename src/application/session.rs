//! Chat session orchestrator.
//!
//! Drives one user turn at a time: records the user message, classifies it for
//! handoff, opens the completion stream, assembles the answer delta by delta,
//! then persists and (when warranted) appends a handoff offer.
//!
//! The transcript lives behind a short-lived lock that is never held across an
//! await, so suspension happens only at the provider and store calls.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;

use crate::config::SessionConfig;
use crate::domain::conversation::{
    FailureKind, HandoffDetector, HandoffReason, Message, MessageRole, SessionContext, Transcript,
    TranscriptError, TurnState,
};
use crate::domain::foundation::{ConversationId, MessageId, StateMachine, TurnId};
use crate::ports::{AIError, AIProvider, CompletionRequest, ConversationStore, RequestMetadata};

/// Errors that reject a submit before any state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("A turn is already in progress")]
    TurnInProgress,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Transcript rejected the turn: {0}")]
    Transcript(#[from] TranscriptError),
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "kind")]
pub enum TurnStatus {
    /// The answer was finalized.
    Completed,
    /// The placeholder shows failure text instead of an answer.
    Failed(FailureKind),
}

/// Result of one submitted turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub turn: TurnId,
    /// The assistant placeholder that received the answer or failure text.
    pub assistant_message_id: MessageId,
    pub status: TurnStatus,
    /// The offer appended this turn, if any.
    pub handoff: Option<HandoffReason>,
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == TurnStatus::Completed
    }
}

#[derive(Debug, Default)]
struct SessionInner {
    transcript: Transcript,
    state: TurnState,
    current_turn: TurnId,
    conversation_id: Option<ConversationId>,
    low_confidence_streak: u32,
}

impl SessionInner {
    fn advance(&mut self, next: TurnState) {
        match self.state.transition_to(next) {
            Ok(state) => self.state = state,
            Err(err) => tracing::warn!(error = %err, "Rejected turn state change"),
        }
    }
}

/// One live conversation between a caller and the assistant.
pub struct ChatSession<P, S>
where
    P: AIProvider,
    S: ConversationStore,
{
    ai_provider: Arc<P>,
    store: Arc<S>,
    context: SessionContext,
    detector: HandoffDetector,
    inner: Mutex<SessionInner>,
    updates: watch::Sender<Vec<Message>>,
}

impl<P, S> ChatSession<P, S>
where
    P: AIProvider,
    S: ConversationStore,
{
    /// Creates an idle session with an empty transcript.
    pub fn new(
        ai_provider: Arc<P>,
        store: Arc<S>,
        context: SessionContext,
        config: &SessionConfig,
    ) -> Self {
        let (updates, _) = watch::channel(Vec::new());
        Self {
            ai_provider,
            store,
            context,
            detector: HandoffDetector::default()
                .with_low_confidence_threshold(config.low_confidence_threshold),
            inner: Mutex::new(SessionInner::default()),
            updates,
        }
    }

    /// Copy of the transcript as it stands.
    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().transcript.messages().to_vec()
    }

    /// Receiver updated after every transcript change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.updates.subscribe()
    }

    pub fn state(&self) -> TurnState {
        self.lock().state
    }

    /// Id assigned by the store, once a conversation exists.
    pub fn conversation_id(&self) -> Option<ConversationId> {
        self.lock().conversation_id
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Runs one full turn for `text`.
    ///
    /// Upstream and transport failures do not return `Err`: they end the turn
    /// with failure text in the assistant placeholder and a
    /// `TurnStatus::Failed` outcome.
    pub async fn submit(&self, text: impl Into<String>) -> Result<TurnOutcome, SubmitError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SubmitError::EmptyMessage);
        }

        let (turn, assistant_id, history) = {
            let mut inner = self.lock();
            if !inner.state.accepts_submit() || inner.transcript.in_flight().is_some() {
                tracing::debug!(state = ?inner.state, "Rejecting submit while a turn is active");
                return Err(SubmitError::TurnInProgress);
            }
            inner.advance(TurnState::Sending);
            inner.current_turn = inner.current_turn.next();
            inner.transcript.append_user(text.as_str());
            let history = inner.transcript.history();
            let assistant_id = match inner.transcript.begin_assistant_turn() {
                Ok(id) => id,
                Err(err) => {
                    inner.advance(TurnState::Errored);
                    inner.advance(TurnState::Idle);
                    return Err(err.into());
                }
            };
            self.publish(&inner);
            (inner.current_turn, assistant_id, history)
        };
        tracing::info!(%turn, "Turn started");

        let conversation_id = self.ensure_conversation().await;
        if let Some(id) = &conversation_id {
            self.persist(id, MessageRole::User, &text, &Value::Null).await;
        }

        let user_intent = self.detector.detect(&text);
        if let Some(reason) = user_intent {
            tracing::info!(%turn, reason = reason.as_str(), "Handoff intent detected");
        }

        let request = history
            .into_iter()
            .fold(
                CompletionRequest::new(RequestMetadata::new(conversation_id, turn)),
                |request, (role, content)| request.with_message(role, content),
            )
            .with_subject(self.context.subject.clone())
            .with_preferences(self.context.preferences.clone());

        let mut stream = match self.ai_provider.stream_complete(request).await {
            Ok(stream) => stream,
            Err(err) => return Ok(self.fail_turn(turn, assistant_id, &err, user_intent)),
        };
        self.with_current_turn(turn, |inner| inner.advance(TurnState::Streaming));

        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    if !chunk.delta.is_empty() {
                        self.apply_delta(turn, assistant_id, &chunk.delta);
                    }
                    if chunk.is_final() {
                        tracing::debug!(%turn, reason = ?chunk.finish_reason, "Stream ended");
                        break;
                    }
                }
                Err(err) => return Ok(self.fail_turn(turn, assistant_id, &err, user_intent)),
            }
        }
        drop(stream);

        Ok(self.finish_turn(turn, assistant_id, user_intent).await)
    }

    /// Creates the backing conversation on first use, when the caller is known.
    async fn ensure_conversation(&self) -> Option<ConversationId> {
        let existing = self.lock().conversation_id;
        if existing.is_some() {
            return existing;
        }
        let seed = self.context.seed()?;

        match self.store.create_conversation(&seed).await {
            Ok(id) => {
                tracing::info!(conversation_id = %id, "Conversation created");
                let mut inner = self.lock();
                Some(*inner.conversation_id.get_or_insert(id))
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to create conversation; will retry next turn");
                None
            }
        }
    }

    async fn persist(&self, id: &ConversationId, role: MessageRole, content: &str, metadata: &Value) {
        if let Err(err) = self.store.append_message(id, role, content, metadata).await {
            tracing::warn!(
                conversation_id = %id,
                role = role.as_str(),
                error = %err,
                "Failed to persist message"
            );
        }
    }

    fn apply_delta(&self, turn: TurnId, id: MessageId, fragment: &str) {
        let applied = self.with_current_turn(turn, |inner| inner.transcript.apply_delta(id, fragment));
        if let Some(Err(err)) = applied {
            tracing::debug!(%turn, error = %err, "Dropping delta");
        }
    }

    async fn finish_turn(
        &self,
        turn: TurnId,
        id: MessageId,
        user_intent: Option<HandoffReason>,
    ) -> TurnOutcome {
        let finalized = self.with_current_turn(turn, |inner| {
            inner.advance(TurnState::Finalizing);
            let message = match inner.transcript.finalize(id) {
                Ok(message) => message,
                Err(err) => {
                    tracing::debug!(%turn, error = %err, "Placeholder already closed");
                    inner.advance(TurnState::Idle);
                    return None;
                }
            };

            let low_confidence = self
                .detector
                .should_trigger_low_confidence(&message.content, inner.low_confidence_streak);
            inner.low_confidence_streak = if self.detector.is_low_confidence(&message.content) {
                inner.low_confidence_streak.saturating_add(1)
            } else {
                0
            };
            let offer = HandoffDetector::select_offer(user_intent, low_confidence);
            if offer.is_some() {
                inner.low_confidence_streak = 0;
            }
            Some((message, offer, inner.conversation_id))
        });

        let Some(Some((message, offer, conversation_id))) = finalized else {
            tracing::debug!(%turn, "Nothing to finalize");
            return TurnOutcome {
                turn,
                assistant_message_id: id,
                status: TurnStatus::Completed,
                handoff: None,
            };
        };

        if let Some(conversation_id) = &conversation_id {
            let metadata = match offer {
                Some(reason) => json!({ "handoff_offered": reason.as_str() }),
                None => Value::Null,
            };
            self.persist(conversation_id, MessageRole::Assistant, &message.content, &metadata)
                .await;
        }

        self.with_current_turn(turn, |inner| {
            if let Some(reason) = offer {
                inner.transcript.append_handoff_offer(reason);
            }
            inner.advance(TurnState::Idle);
        });
        tracing::info!(%turn, chars = message.content.len(), handoff = ?offer, "Turn completed");

        TurnOutcome {
            turn,
            assistant_message_id: id,
            status: TurnStatus::Completed,
            handoff: offer,
        }
    }

    /// Renders the failure into the placeholder and returns to idle.
    fn fail_turn(
        &self,
        turn: TurnId,
        id: MessageId,
        err: &AIError,
        user_intent: Option<HandoffReason>,
    ) -> TurnOutcome {
        let kind = err.failure_kind();
        tracing::warn!(%turn, error = %err, kind = ?kind, "Turn failed");

        self.with_current_turn(turn, |inner| {
            inner.advance(TurnState::Errored);
            if let Err(err) = inner.transcript.fail(id, kind.user_message()) {
                tracing::debug!(%turn, error = %err, "Placeholder already closed");
            }
            if let Some(reason) = user_intent {
                inner.transcript.append_handoff_offer(reason);
            }
            inner.advance(TurnState::Idle);
        });

        TurnOutcome {
            turn,
            assistant_message_id: id,
            status: TurnStatus::Failed(kind),
            handoff: user_intent,
        }
    }

    /// Applies `f` only if `turn` is still the current turn, then publishes.
    fn with_current_turn<R>(
        &self,
        turn: TurnId,
        f: impl FnOnce(&mut SessionInner) -> R,
    ) -> Option<R> {
        let mut inner = self.lock();
        if inner.current_turn != turn {
            tracing::debug!(%turn, current = %inner.current_turn, "Dropping update from stale turn");
            return None;
        }
        let result = f(&mut inner);
        self.publish(&inner);
        Some(result)
    }

    fn publish(&self, inner: &SessionInner) {
        self.updates.send_replace(inner.transcript.messages().to_vec());
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
