//! Integration tests for the HTTP completion adapter.
//!
//! A wiremock server stands in for the completion endpoint, so these tests
//! cover the request body, the bearer header, status classification and
//! body decoding over a real HTTP connection.

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use estate_concierge::adapters::ai::sse_body;
use estate_concierge::adapters::{OpenAIConfig, OpenAIProvider};
use estate_concierge::domain::conversation::{FailureKind, MessageRole};
use estate_concierge::domain::foundation::TurnId;
use estate_concierge::ports::{
    AIError, AIProvider, CompletionRequest, FinishReason, RequestMetadata, StreamChunk,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

fn provider_for(server: &MockServer) -> OpenAIProvider {
    let config = OpenAIConfig::new(format!("{}{}", server.uri(), COMPLETIONS_PATH))
        .with_api_key("test-key")
        .with_model("listing-assistant");
    OpenAIProvider::new(config).unwrap()
}

fn request(text: &str) -> CompletionRequest {
    CompletionRequest::new(RequestMetadata::new(None, TurnId::ZERO.next()))
        .with_message(MessageRole::User, text)
        .with_subject(Some(json!({"listing": "L-42"})))
}

async fn mount_status(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream says no"))
        .mount(server)
        .await;
}

// =============================================================================
// Streaming
// =============================================================================

#[tokio::test]
async fn streams_deltas_until_terminator() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "listing-assistant",
            "stream": true,
            "messages": [{"role": "user", "content": "Hello"}],
            "subject": {"listing": "L-42"}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["Hi", ", how can ", "I help?"]), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let stream = provider_for(&server)
        .stream_complete(request("Hello"))
        .await
        .unwrap();
    let chunks: Vec<_> = stream.collect().await;

    assert_eq!(
        chunks,
        vec![
            Ok(StreamChunk::content("Hi")),
            Ok(StreamChunk::content(", how can ")),
            Ok(StreamChunk::content("I help?")),
            Ok(StreamChunk::finished(FinishReason::Done)),
        ]
    );
}

#[tokio::test]
async fn ignores_bytes_after_terminator() {
    let server = MockServer::start().await;
    let mut body = sse_body(&["done"]);
    body.extend_from_slice(b"data: {\"choices\":[{\"delta\":{\"content\":\"ghost\"}}]}\n");
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let text: String = provider_for(&server)
        .stream_complete(request("Hi"))
        .await
        .unwrap()
        .filter_map(|c| async move { c.ok() })
        .map(|c| c.delta)
        .collect::<Vec<_>>()
        .await
        .concat();

    assert_eq!(text, "done");
}

#[tokio::test]
async fn body_without_terminator_closes_cleanly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b": keep-alive\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"cut\"}}]}\n".to_vec(),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let chunks: Vec<_> = provider_for(&server)
        .stream_complete(request("Hi"))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(
        chunks,
        vec![
            Ok(StreamChunk::content("cut")),
            Ok(StreamChunk::finished(FinishReason::Closed)),
        ]
    );
}

// =============================================================================
// Status classification
// =============================================================================

#[tokio::test]
async fn rate_limit_status_is_classified() {
    let server = MockServer::start().await;
    mount_status(&server, 429).await;

    let err = provider_for(&server)
        .stream_complete(request("Hi"))
        .await
        .err()
        .unwrap();

    assert_eq!(err, AIError::RateLimited);
    assert_eq!(err.failure_kind(), FailureKind::RateLimited);
}

#[tokio::test]
async fn quota_status_is_classified() {
    let server = MockServer::start().await;
    mount_status(&server, 402).await;

    let err = provider_for(&server)
        .stream_complete(request("Hi"))
        .await
        .err()
        .unwrap();

    assert_eq!(err.failure_kind(), FailureKind::QuotaExhausted);
}

#[tokio::test]
async fn server_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    mount_status(&server, 503).await;

    let err = provider_for(&server)
        .stream_complete(request("Hi"))
        .await
        .err()
        .unwrap();

    assert_eq!(
        err,
        AIError::Unavailable {
            status: 503,
            message: "upstream says no".to_string()
        }
    );
}

#[tokio::test]
async fn other_status_is_generic() {
    let server = MockServer::start().await;
    mount_status(&server, 400).await;

    let err = provider_for(&server)
        .stream_complete(request("Hi"))
        .await
        .err()
        .unwrap();

    assert_eq!(err.failure_kind(), FailureKind::Generic);
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_failure() {
    // Reserve a free port, then close it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let provider = OpenAIProvider::new(OpenAIConfig::new(format!(
        "http://127.0.0.1:{}{}",
        port, COMPLETIONS_PATH
    )))
    .unwrap();
    let err = provider.stream_complete(request("Hi")).await.err().unwrap();

    assert!(matches!(err, AIError::Network(_)), "unexpected error: {:?}", err);
    assert_eq!(err.failure_kind(), FailureKind::Transport);
}
