//! Classified protocol lines.

/// One decoded line of the event stream, after classification.
///
/// Frames are ephemeral: they exist only while a response body is being
/// decoded and are never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// Blank line, keep-alive, or `:` comment. Ignored.
    Comment,
    /// A content fragment. May be empty.
    Delta(String),
    /// The `[DONE]` sentinel. Ends the read loop.
    Terminator,
    /// Anything that could not be classified. Never fatal.
    Malformed(MalformedKind),
}

impl StreamFrame {
    /// Returns the fragment if this is a delta frame.
    pub fn as_delta(&self) -> Option<&str> {
        match self {
            StreamFrame::Delta(text) => Some(text),
            _ => None,
        }
    }

    /// Returns true for the terminator sentinel.
    pub fn is_terminator(&self) -> bool {
        matches!(self, StreamFrame::Terminator)
    }
}

/// Why a line was classified as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// A data line whose payload is not (yet) valid JSON. Recoverable once
    /// the rest of the payload arrives.
    IncompleteJson,
    /// A data line holding valid JSON that is not an object.
    NotAnObject,
    /// A line without the data prefix (`event:`, `id:`, stray text).
    UnknownLine,
}
