//! Integration tests for full chat turns.
//!
//! Drives `ChatSession` with the scripted provider and the in-memory store:
//! 1. Chunked bodies assemble into one finalized answer
//! 2. Exactly one assistant write per completed turn
//! 3. Handoff offers appear once, with user intent taking priority
//! 4. A submit during an active turn leaves the transcript untouched
//! 5. Upstream failures render as text; store failures never surface

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use estate_concierge::adapters::ai::{sse_body, sse_event, MockAIProvider};
use estate_concierge::adapters::InMemoryConversationStore;
use estate_concierge::application::{ChatSession, SubmitError, TurnStatus};
use estate_concierge::config::SessionConfig;
use estate_concierge::domain::conversation::{
    FailureKind, HandoffReason, MessageRole, MessageStatus, SessionContext, TurnState,
};
use estate_concierge::domain::foundation::UserId;
use estate_concierge::ports::AIError;

// =============================================================================
// Test Infrastructure
// =============================================================================

type Session = ChatSession<MockAIProvider, InMemoryConversationStore>;

struct Harness {
    session: Arc<Session>,
    provider: Arc<MockAIProvider>,
    store: Arc<InMemoryConversationStore>,
}

fn harness(provider: MockAIProvider, config: SessionConfig) -> Harness {
    let provider = Arc::new(provider);
    let store = Arc::new(InMemoryConversationStore::new());
    let context = SessionContext::for_caller(UserId::new("buyer-77").unwrap())
        .with_subject(json!({"id": "listing-3", "city": "Porto"}));
    let session = Arc::new(ChatSession::new(
        provider.clone(),
        store.clone(),
        context,
        &config,
    ));
    Harness {
        session,
        provider,
        store,
    }
}

fn default_harness(provider: MockAIProvider) -> Harness {
    harness(provider, SessionConfig::default())
}

// =============================================================================
// Streaming assembly
// =============================================================================

#[tokio::test]
async fn chunked_answer_is_assembled_and_persisted_once() {
    let provider = MockAIProvider::new().with_body(vec![
        Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel".to_vec()),
        Ok(b"lo\"}}]}\n".to_vec()),
        Ok(b"data: [DONE]\n".to_vec()),
    ]);
    let h = default_harness(provider);

    let outcome = h.session.submit("Hi there").await.unwrap();

    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(h.session.state(), TurnState::Idle);
    let messages = h.session.snapshot();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "Hello");

    let assistant = h.store.messages_with_role(MessageRole::Assistant).await;
    assert_eq!(assistant.len(), 1);
    assert_eq!(assistant[0].content, "Hello");
    assert_eq!(assistant[0].metadata, Value::Null);

    let user = h.store.messages_with_role(MessageRole::User).await;
    assert_eq!(user.len(), 1);
    assert_eq!(user[0].content, "Hi there");
}

#[tokio::test]
async fn bytewise_delivery_matches_single_chunk() {
    let body = sse_body(&["Three ", "bedrooms, ", "südlich ", "gelegen 🏠"]);
    let whole = default_harness(MockAIProvider::new().with_body(vec![Ok(body.clone())]));
    let bytewise = default_harness(MockAIProvider::new().with_bytewise_body(&body));

    whole.session.submit("Layout?").await.unwrap();
    bytewise.session.submit("Layout?").await.unwrap();

    let expected = "Three bedrooms, südlich gelegen 🏠";
    assert_eq!(whole.session.snapshot()[1].content, expected);
    assert_eq!(bytewise.session.snapshot()[1].content, expected);
}

#[tokio::test]
async fn broken_json_line_is_recovered() {
    let provider = MockAIProvider::new().with_body(vec![
        Ok(b"data: {\"choices\":[{\"delta\":{\"conte\n".to_vec()),
        Ok(b"nt\":\"hi\"}}]}\n".to_vec()),
        Ok(b"data: [DONE]\n".to_vec()),
    ]);
    let h = default_harness(provider);

    h.session.submit("Hello").await.unwrap();

    assert_eq!(h.session.snapshot()[1].content, "hi");
}

#[tokio::test]
async fn seed_captures_subject_on_first_turn() {
    let h = default_harness(MockAIProvider::new());

    h.session.submit("Hello").await.unwrap();

    let id = h.session.conversation_id().unwrap();
    let seed = h.store.seed(&id).await.unwrap();
    assert_eq!(seed.caller.as_str(), "buyer-77");
    assert_eq!(seed.subject, Some(json!({"id": "listing-3", "city": "Porto"})));
}

// =============================================================================
// Handoff
// =============================================================================

#[tokio::test]
async fn explicit_request_appends_exactly_one_offer() {
    let h = default_harness(MockAIProvider::new().with_deltas(&["Of course, ", "one moment."]));

    let outcome = h.session.submit("talk to a human").await.unwrap();

    assert_eq!(h.provider.call_count(), 1);
    assert_eq!(outcome.handoff, Some(HandoffReason::ExplicitRequest));
    let messages = h.session.snapshot();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].content, "Of course, one moment.");
    assert_eq!(messages[2].handoff, Some(HandoffReason::ExplicitRequest));
    assert!(messages[2].content.is_empty());
}

#[tokio::test]
async fn user_intent_wins_over_low_confidence() {
    let config = SessionConfig {
        low_confidence_threshold: 1,
        ..Default::default()
    };
    let h = harness(
        MockAIProvider::new().with_deltas(&["I'm not sure I can arrange that."]),
        config,
    );

    let outcome = h
        .session
        .submit("I want to book a viewing for Saturday")
        .await
        .unwrap();

    assert_eq!(outcome.handoff, Some(HandoffReason::TransactionIntent));
    let offers: Vec<_> = h
        .session
        .snapshot()
        .into_iter()
        .filter(|m| m.is_handoff_offer())
        .collect();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].handoff, Some(HandoffReason::TransactionIntent));
}

#[tokio::test]
async fn offers_are_not_sent_upstream() {
    let provider = MockAIProvider::new()
        .with_deltas(&["Sure."])
        .with_deltas(&["It is 85 square metres."]);
    let h = default_harness(provider);

    h.session.submit("Can I speak to an agent?").await.unwrap();
    h.session.submit("How big is it?").await.unwrap();

    let second = &h.provider.get_calls()[1];
    assert_eq!(second.messages.len(), 3);
    assert!(second.messages.iter().all(|m| !m.content.is_empty()));
}

// =============================================================================
// Single in-flight turn
// =============================================================================

#[tokio::test]
async fn submit_during_active_turn_is_rejected() {
    let (provider, sender) = MockAIProvider::new().with_body_channel();
    let h = default_harness(provider);
    let mut updates = h.session.subscribe();

    let running = {
        let session = h.session.clone();
        tokio::spawn(async move { session.submit("First question").await })
    };

    sender
        .unbounded_send(Ok(sse_event("Working on it").into_bytes()))
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            updates.changed().await.unwrap();
            let streaming = updates
                .borrow()
                .iter()
                .any(|m| m.content == "Working on it" && m.status == MessageStatus::Streaming);
            if streaming {
                break;
            }
        }
    })
    .await
    .unwrap();

    let before = h.session.snapshot().len();
    assert_eq!(h.session.state(), TurnState::Streaming);
    assert_eq!(
        h.session.submit("Second question").await,
        Err(SubmitError::TurnInProgress)
    );
    assert_eq!(h.session.snapshot().len(), before);

    sender
        .unbounded_send(Ok(b"data: [DONE]\n".to_vec()))
        .unwrap();
    let outcome = running.await.unwrap().unwrap();

    assert!(outcome.is_completed());
    assert_eq!(h.session.snapshot()[1].content, "Working on it");
    assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test]
async fn submit_while_request_pending_is_rejected() {
    let h = default_harness(
        MockAIProvider::new()
            .with_delay(Duration::from_millis(200))
            .with_deltas(&["Eventually."]),
    );
    let mut updates = h.session.subscribe();

    let running = {
        let session = h.session.clone();
        tokio::spawn(async move { session.submit("Is it still available?").await })
    };

    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(h.session.state(), TurnState::Sending);
    assert_eq!(
        h.session.submit("Hello?").await,
        Err(SubmitError::TurnInProgress)
    );
    assert_eq!(h.session.snapshot().len(), 2);

    let outcome = running.await.unwrap().unwrap();
    assert!(outcome.is_completed());
    assert_eq!(h.session.snapshot()[1].content, "Eventually.");
    assert_eq!(h.provider.call_count(), 1);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn each_failure_class_has_distinct_text() {
    let cases = [
        (AIError::RateLimited, FailureKind::RateLimited),
        (AIError::QuotaExhausted, FailureKind::QuotaExhausted),
        (AIError::from_status(502, "bad gateway"), FailureKind::Unavailable),
        (AIError::network("dns failure"), FailureKind::Transport),
        (AIError::from_status(418, "teapot"), FailureKind::Generic),
    ];

    for (error, kind) in cases {
        let h = default_harness(MockAIProvider::new().with_error(error));

        let outcome = h.session.submit("Hello").await.unwrap();

        assert_eq!(outcome.status, TurnStatus::Failed(kind));
        let placeholder = &h.session.snapshot()[1];
        assert_eq!(placeholder.content, kind.user_message());
        assert_eq!(placeholder.status, MessageStatus::Failed);
        assert_eq!(h.session.state(), TurnState::Idle);
        assert!(h
            .store
            .messages_with_role(MessageRole::Assistant)
            .await
            .is_empty());
    }
}

#[tokio::test]
async fn store_failures_do_not_interrupt_turn() {
    let h = default_harness(MockAIProvider::new().with_deltas(&["Still here."]));
    h.store.set_fail_appends(true);

    let outcome = h.session.submit("Hello").await.unwrap();

    assert!(outcome.is_completed());
    assert_eq!(h.session.snapshot()[1].content, "Still here.");
    assert!(h.store.messages().await.is_empty());
}

#[tokio::test]
async fn session_recovers_after_failed_turn() {
    let provider = MockAIProvider::new()
        .with_error(AIError::from_status(500, "oops"))
        .with_deltas(&["Back online."]);
    let h = default_harness(provider);

    h.session.submit("Hello?").await.unwrap();
    let outcome = h.session.submit("Hello again").await.unwrap();

    assert!(outcome.is_completed());
    let messages = h.session.snapshot();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[3].content, "Back online.");
}
