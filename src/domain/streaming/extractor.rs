//! Line classification and delta extraction.

use serde_json::Value;

use super::decoder::DEFAULT_MAX_LINE_BYTES;
use super::frame::{MalformedKind, StreamFrame};

/// Prefix of every data line.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that marks the graceful end of the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

const COMMENT_MARKER: char = ':';
const CONTENT_POINTER: &str = "/choices/0/delta/content";

/// Classifies a single complete line, without any recovery state.
pub fn classify_line(line: &str) -> StreamFrame {
    if line.trim().is_empty() || line.starts_with(COMMENT_MARKER) {
        return StreamFrame::Comment;
    }

    match line.strip_prefix(DATA_PREFIX) {
        Some(payload) if payload.trim() == DONE_SENTINEL => StreamFrame::Terminator,
        Some(payload) if payload.trim().is_empty() => StreamFrame::Comment,
        Some(payload) => parse_payload(payload),
        None => StreamFrame::Malformed(MalformedKind::UnknownLine),
    }
}

/// Parses a data payload and pulls the text at `choices[0].delta.content`.
///
/// A missing or non-string path yields an empty fragment.
fn parse_payload(payload: &str) -> StreamFrame {
    match serde_json::from_str::<Value>(payload) {
        Ok(value) if value.is_object() => {
            let text = value
                .pointer(CONTENT_POINTER)
                .and_then(Value::as_str)
                .unwrap_or_default();
            StreamFrame::Delta(text.to_string())
        }
        Ok(_) => StreamFrame::Malformed(MalformedKind::NotAnObject),
        Err(_) => StreamFrame::Malformed(MalformedKind::IncompleteJson),
    }
}

/// Stateful classifier that recovers data lines split by imperfect framing.
///
/// A data line whose JSON fails to parse is parked rather than dropped: the
/// "complete" line may be an artifact of a line break landing inside the
/// payload. Every later line is first joined onto the parked payload and
/// re-parsed, until it parses, a fresh frame supersedes it, or the stream
/// ends.
#[derive(Debug)]
pub struct DeltaExtractor {
    pending_line: Option<String>,
    max_pending_bytes: usize,
}

impl Default for DeltaExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

impl DeltaExtractor {
    /// Creates an extractor that gives up on parked payloads over `max_pending_bytes`.
    pub fn new(max_pending_bytes: usize) -> Self {
        Self {
            pending_line: None,
            max_pending_bytes: max_pending_bytes.max(1),
        }
    }

    /// Classifies the next complete line.
    pub fn on_line(&mut self, line: &str) -> StreamFrame {
        if let Some(parked) = self.pending_line.take() {
            return self.resume(parked, line);
        }

        let frame = classify_line(line);
        if frame == StreamFrame::Malformed(MalformedKind::IncompleteJson) {
            self.park(data_payload(line));
        }
        frame
    }

    fn resume(&mut self, parked: String, line: &str) -> StreamFrame {
        let joined = format!("{parked}{line}");
        if let frame @ StreamFrame::Delta(_) = parse_payload(&joined) {
            return frame;
        }

        // The line did not complete the parked payload. If it stands on its
        // own as a new frame, the parked payload was garbage.
        let standalone = classify_line(line);
        match standalone {
            StreamFrame::Delta(_) | StreamFrame::Terminator => {
                tracing::debug!(dropped = parked.len(), "Dropping unrecoverable data line");
                standalone
            }
            StreamFrame::Malformed(MalformedKind::IncompleteJson) => {
                tracing::debug!(dropped = parked.len(), "Dropping unrecoverable data line");
                self.park(data_payload(line));
                standalone
            }
            StreamFrame::Comment => {
                self.park(parked);
                StreamFrame::Comment
            }
            _ => {
                self.park(joined);
                StreamFrame::Malformed(MalformedKind::IncompleteJson)
            }
        }
    }

    fn park(&mut self, payload: String) {
        if payload.len() > self.max_pending_bytes {
            tracing::warn!(
                pending = payload.len(),
                limit = self.max_pending_bytes,
                "Parked data line exceeds limit, discarding"
            );
            return;
        }
        self.pending_line = Some(payload);
    }

    /// Returns true while a data line is parked awaiting completion.
    pub fn has_pending(&self) -> bool {
        self.pending_line.is_some()
    }

    /// Discards any parked payload.
    pub fn reset(&mut self) {
        if let Some(parked) = self.pending_line.take() {
            tracing::debug!(dropped = parked.len(), "Discarding parked data line");
        }
    }
}

fn data_payload(line: &str) -> String {
    line.strip_prefix(DATA_PREFIX).unwrap_or(line).to_string()
}
