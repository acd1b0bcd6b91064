//! Byte-to-line framing.
//!
//! Lines are split on the raw `\n` byte before any text decoding happens.
//! UTF-8 never uses `0x0A` inside a multi-byte sequence, so a chunk boundary
//! that lands in the middle of a character simply stays in the buffer until
//! the rest of the line arrives.

/// Default cap on unterminated bytes held in the buffer (1 MiB).
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Incremental line decoder over an unbounded sequence of byte chunks.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to contain no newline.
    scanned: usize,
    max_line_bytes: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

impl FrameDecoder {
    /// Creates a decoder that resets after `max_line_bytes` unterminated bytes.
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            max_line_bytes: max_line_bytes.max(1),
        }
    }

    /// Appends a chunk as delivered by the transport.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Pops the next complete line, without its `\n` and trailing `\r`.
    ///
    /// Returns `None` when only a partial line (or nothing) is buffered.
    pub fn next_line(&mut self) -> Option<String> {
        match self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let end = self.scanned + offset;
                let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                self.scanned = 0;
                Some(String::from_utf8_lossy(&line).into_owned())
            }
            None => {
                self.scanned = self.buffer.len();
                if self.buffer.len() > self.max_line_bytes {
                    tracing::warn!(
                        buffered = self.buffer.len(),
                        limit = self.max_line_bytes,
                        "Unterminated line exceeds limit, resetting frame buffer"
                    );
                    self.clear();
                }
                None
            }
        }
    }

    /// Lazily iterates over the complete lines currently buffered.
    pub fn lines(&mut self) -> Lines<'_> {
        Lines { decoder: self }
    }

    /// Number of bytes waiting for a line terminator.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drops everything buffered.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }

    /// Ends the stream, discarding any unterminated remainder.
    ///
    /// Returns the number of bytes discarded.
    pub fn finish(&mut self) -> usize {
        let discarded = self.buffer.len();
        if discarded > 0 {
            tracing::debug!(discarded, "Discarding unterminated bytes at end of stream");
        }
        self.clear();
        discarded
    }
}

/// Iterator returned by [`FrameDecoder::lines`].
pub struct Lines<'a> {
    decoder: &'a mut FrameDecoder,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.next_line()
    }
}
