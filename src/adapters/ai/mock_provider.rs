//! Mock AI Provider for testing.
//!
//! Scripted implementation of the AIProvider port. Every response body is
//! raw event-stream bytes, decoded the same way as a live endpoint's.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_deltas(&["Hel", "lo"])
//!     .with_error(AIError::RateLimited);
//!
//! let (provider, sender) = MockAIProvider::new().with_body_channel();
//! sender.unbounded_send(Ok(sse_event("partial").into_bytes()))?;
//! ```

use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::stream;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use super::sse_stream::decode_body;
use crate::domain::streaming::{DEFAULT_MAX_LINE_BYTES, DONE_SENTINEL};
use crate::ports::{AIError, AIProvider, ChunkStream, CompletionRequest, ProviderInfo};

/// One transport chunk, or a transport failure.
pub type BodyChunk = Result<Vec<u8>, String>;

/// A configured mock response.
pub enum MockResponse {
    /// Serve these body chunks, then close.
    Body(Vec<BodyChunk>),
    /// Fail before any body is obtained.
    Error(AIError),
    /// Serve chunks as they are sent; close when the sender drops.
    Channel(UnboundedReceiver<BodyChunk>),
}

impl fmt::Debug for MockResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body(chunks) => f.debug_tuple("Body").field(&chunks.len()).finish(),
            Self::Error(err) => f.debug_tuple("Error").field(err).finish(),
            Self::Channel(_) => f.write_str("Channel"),
        }
    }
}

/// Mock AI provider for testing.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Provider info to return.
    info: ProviderInfo,
    /// Simulated latency before the response headers.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats one content delta as an event-stream data line.
pub fn sse_event(delta: &str) -> String {
    let payload = serde_json::json!({"choices": [{"delta": {"content": delta}}]});
    format!("data: {}\n\n", payload)
}

/// Builds a complete body: one event per delta, then the terminator.
pub fn sse_body(deltas: &[&str]) -> Vec<u8> {
    let mut body: String = deltas.iter().map(|d| sse_event(d)).collect();
    body.push_str("data: ");
    body.push_str(DONE_SENTINEL);
    body.push_str("\n\n");
    body.into_bytes()
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", Some("mock-model-1".to_string())),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a well-formed answer made of these deltas.
    pub fn with_deltas(self, deltas: &[&str]) -> Self {
        self.with_body(vec![Ok(sse_body(deltas))])
    }

    /// Queues a body delivered in exactly these chunks.
    pub fn with_body(self, chunks: Vec<BodyChunk>) -> Self {
        self.push(MockResponse::Body(chunks));
        self
    }

    /// Queues a raw body delivered one byte at a time.
    pub fn with_bytewise_body(self, body: &[u8]) -> Self {
        self.with_body(body.iter().map(|b| Ok(vec![*b])).collect())
    }

    /// Queues an error response.
    pub fn with_error(self, error: AIError) -> Self {
        self.push(MockResponse::Error(error));
        self
    }

    /// Queues a body fed by the returned sender.
    pub fn with_body_channel(self) -> (Self, UnboundedSender<BodyChunk>) {
        let (sender, receiver) = mpsc::unbounded();
        self.push(MockResponse::Channel(receiver));
        (self, sender)
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    fn push(&self, response: MockResponse) {
        lock(&self.responses).push_back(response);
    }

    /// Gets the next response, or a short default answer.
    fn next_response(&self) -> MockResponse {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Body(vec![Ok(sse_body(&["Mock response"]))]))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        lock(&self.calls).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            MockResponse::Body(chunks) => {
                Ok(decode_body(stream::iter(chunks), DEFAULT_MAX_LINE_BYTES))
            }
            MockResponse::Error(err) => Err(err),
            MockResponse::Channel(receiver) => Ok(decode_body(receiver, DEFAULT_MAX_LINE_BYTES)),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
