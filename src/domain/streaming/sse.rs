//! Combined event-stream decoder.

use super::decoder::{FrameDecoder, DEFAULT_MAX_LINE_BYTES};
use super::extractor::DeltaExtractor;
use super::frame::StreamFrame;

/// Result of feeding one transport chunk into the decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Non-empty content fragments, in arrival order.
    pub deltas: Vec<String>,
    /// True once the terminator sentinel has been seen.
    pub terminated: bool,
}

/// Pure decoder from response-body chunks to content deltas.
///
/// Holds no I/O: the caller awaits the transport and hands over each chunk.
/// After the terminator sentinel every remaining and future byte is ignored.
#[derive(Debug)]
pub struct SseDecoder {
    frames: FrameDecoder,
    extractor: DeltaExtractor,
    terminated: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    /// Creates a decoder with the given cap on unterminated or parked bytes.
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            frames: FrameDecoder::new(max_line_bytes),
            extractor: DeltaExtractor::new(max_line_bytes),
            terminated: false,
        }
    }

    /// Feeds one chunk and returns the deltas it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> DecodeOutcome {
        let mut outcome = DecodeOutcome {
            deltas: Vec::new(),
            terminated: self.terminated,
        };
        if self.terminated {
            return outcome;
        }

        self.frames.push(chunk);
        while let Some(line) = self.frames.next_line() {
            match self.extractor.on_line(&line) {
                StreamFrame::Delta(text) => {
                    if !text.is_empty() {
                        outcome.deltas.push(text);
                    }
                }
                StreamFrame::Terminator => {
                    self.terminated = true;
                    self.frames.clear();
                    self.extractor.reset();
                    outcome.terminated = true;
                    break;
                }
                StreamFrame::Malformed(kind) => {
                    tracing::trace!(?kind, "Ignoring malformed stream line");
                }
                StreamFrame::Comment => {}
            }
        }
        outcome
    }

    /// Ends the stream without a terminator, discarding partial input.
    pub fn finish(&mut self) {
        self.frames.finish();
        self.extractor.reset();
    }

    /// Returns true once the terminator sentinel has been seen.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}
