//! Pattern-delimited framing of the debugger's output stream.
//!
//! The debugger does not length-prefix its responses; a response ends when
//! the accumulated output matches a pattern (normally the prompt). Bytes that
//! arrive after the match belong to the next frame and are kept.

use regex::bytes::{Regex, RegexBuilder};

use crate::error::MdbResult;

/// Default prompt: a line starting with `>`.
pub const DEFAULT_PROMPT: &str = "^>";

/// Default acknowledgement line that follows a halt notice.
pub const DEFAULT_HALTED_PATTERN: &str = "HALTED\r?\n";

/// Compile a framing pattern. `^` and `$` anchor at line boundaries.
pub fn compile_pattern(pattern: &str) -> MdbResult<Regex> {
    Ok(RegexBuilder::new(pattern).multi_line(true).build()?)
}

/// Accumulates raw output and splits it into frames.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk read from the output channel.
    pub fn push(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    /// Number of buffered bytes not yet handed out.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Remove and return everything up to and including the first match of
    /// `pattern`, or `None` if the pattern does not match yet.
    pub fn take_frame(&mut self, pattern: &Regex) -> Option<Vec<u8>> {
        let end = pattern.find(&self.data)?.end();
        let rest = self.data.split_off(end);
        Some(std::mem::replace(&mut self.data, rest))
    }

    /// Remove and return everything buffered.
    pub fn take_all(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }
}

/// Decode frame bytes for callers; invalid UTF-8 is replaced.
pub fn decode(frame: &[u8]) -> String {
    String::from_utf8_lossy(frame).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_matches_at_line_start() {
        let prompt = compile_pattern(DEFAULT_PROMPT).unwrap();
        assert!(prompt.is_match(b"Running\n>"));
        assert!(prompt.is_match(b">"));
        assert!(!prompt.is_match(b"x > 3\n"));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(compile_pattern("(").is_err());
    }

    #[test]
    fn frame_not_ready_until_pattern_seen() {
        let prompt = compile_pattern(DEFAULT_PROMPT).unwrap();
        let mut buf = FrameBuffer::new();
        buf.push(b"echo hi\nhi\n");
        assert!(buf.take_frame(&prompt).is_none());
        assert_eq!(buf.len(), 11);

        buf.push(b">");
        let frame = buf.take_frame(&prompt).unwrap();
        assert_eq!(frame, b"echo hi\nhi\n>");
        assert!(buf.is_empty());
    }

    #[test]
    fn bytes_after_match_stay_buffered() {
        let prompt = compile_pattern(DEFAULT_PROMPT).unwrap();
        let halted = compile_pattern(DEFAULT_HALTED_PATTERN).unwrap();
        let mut buf = FrameBuffer::new();
        buf.push(b"Stop at main.c:10\n>Simulator halted\nHALTED\nContinue\n>");

        assert_eq!(buf.take_frame(&prompt).unwrap(), b"Stop at main.c:10\n>");
        assert_eq!(
            buf.take_frame(&halted).unwrap(),
            b"Simulator halted\nHALTED\n"
        );
        assert_eq!(buf.take_frame(&prompt).unwrap(), b"Continue\n>");
        assert!(buf.is_empty());
    }

    #[test]
    fn halted_pattern_accepts_crlf() {
        let halted = compile_pattern(DEFAULT_HALTED_PATTERN).unwrap();
        assert!(halted.is_match(b"HALTED\r\n"));
    }

    #[test]
    fn take_all_drains() {
        let mut buf = FrameBuffer::new();
        buf.push(b"partial");
        assert_eq!(buf.take_all(), b"partial");
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_replaces_invalid_utf8() {
        assert_eq!(decode(b"ok\xff"), "ok\u{fffd}");
    }
}
