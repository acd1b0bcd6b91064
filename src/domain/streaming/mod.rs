//! Streaming module - decoding of the completion endpoint's event stream.
//!
//! The completion endpoint answers with a chunked body of newline-delimited
//! event-stream lines. Decoding happens in three layers, all synchronous and
//! free of I/O so they can be driven directly from tests:
//!
//! - [`FrameDecoder`] buffers raw bytes and yields complete lines.
//! - [`DeltaExtractor`] classifies each line into a [`StreamFrame`], parking
//!   data lines whose JSON was cut short until more bytes arrive.
//! - [`SseDecoder`] combines both and honours the terminator sentinel.

mod decoder;
mod extractor;
mod frame;
mod sse;

pub use decoder::{FrameDecoder, Lines, DEFAULT_MAX_LINE_BYTES};
pub use extractor::{classify_line, DeltaExtractor, DATA_PREFIX, DONE_SENTINEL};
pub use frame::{MalformedKind, StreamFrame};
pub use sse::{DecodeOutcome, SseDecoder};
