//! Adapts a raw response body into a stream of decoded chunks.

use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;

use crate::domain::streaming::SseDecoder;
use crate::ports::{AIError, ChunkStream, FinishReason, StreamChunk};

struct BodyState<S> {
    body: S,
    decoder: SseDecoder,
    ready: VecDeque<Result<StreamChunk, AIError>>,
    done: bool,
}

/// Decodes a byte stream into content chunks.
///
/// The body is polled only when no decoded chunk is waiting, so suspension
/// happens solely at the transport read. After the terminator sentinel the
/// body is dropped unread. A closed body without terminator ends the stream
/// with `FinishReason::Closed`; a transport error ends it with
/// `AIError::Network`.
pub fn decode_body<S, B, E>(body: S, max_line_bytes: usize) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = BodyState {
        body,
        decoder: SseDecoder::new(max_line_bytes),
        ready: VecDeque::new(),
        done: false,
    };

    let chunks = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.ready.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let outcome = state.decoder.feed(bytes.as_ref());
                    state
                        .ready
                        .extend(outcome.deltas.into_iter().map(|d| Ok(StreamChunk::content(d))));
                    if outcome.terminated {
                        state.ready.push_back(Ok(StreamChunk::finished(FinishReason::Done)));
                        state.done = true;
                    }
                }
                Some(Err(err)) => {
                    state.decoder.finish();
                    state
                        .ready
                        .push_back(Err(AIError::network(format!("Stream error: {}", err))));
                    state.done = true;
                }
                None => {
                    state.decoder.finish();
                    tracing::debug!("Response body closed without terminator");
                    state.ready.push_back(Ok(StreamChunk::finished(FinishReason::Closed)));
                    state.done = true;
                }
            }
        }
    });

    Box::pin(chunks)
}
