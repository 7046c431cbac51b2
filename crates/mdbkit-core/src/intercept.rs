//! Detection of asynchronous halt notices inside a response.
//!
//! When a running target hits a breakpoint or watchpoint, the debugger
//! prints a `Stop at …` notice into whatever response is being read, then a
//! `HALTED` acknowledgement, and only then the response to the pending
//! command. This module decides whether a captured frame is such a notice;
//! the session performs the resynchronizing reads.
//!
//! The check is a plain substring match. Ordinary output that happens to
//! contain the marker (a variable dump, say) is misread as a halt, and a
//! second notice arriving during resynchronization is not unwrapped.

/// Default halt-notification marker.
pub const DEFAULT_HALT_MARKER: &str = "Stop at";

/// Default substring that suppresses interception.
pub const DEFAULT_QUIT_EXCLUSION: &str = "quit";

/// Verdict for one captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    /// Ordinary response; hand it to the caller unchanged.
    PassThrough,
    /// Halt notice; the real response follows the `HALTED` line.
    Halt,
}

/// Classifies frames by marker and exclusion substrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaltInterceptor {
    marker: String,
    exclusion: String,
}

impl HaltInterceptor {
    /// Create an interceptor with explicit marker and exclusion strings.
    pub fn new(marker: impl Into<String>, exclusion: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            exclusion: exclusion.into(),
        }
    }

    /// The halt marker being searched for.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Whether `text` carries the halt marker.
    pub fn has_marker(&self, text: &str) -> bool {
        text.contains(&self.marker)
    }

    /// Whether `text` carries the exclusion substring (a quitting session).
    pub fn is_excluded(&self, text: &str) -> bool {
        !self.exclusion.is_empty() && text.contains(&self.exclusion)
    }

    /// Classify a captured frame.
    pub fn inspect(&self, text: &str) -> Interception {
        if self.has_marker(text) && !self.is_excluded(text) {
            Interception::Halt
        } else {
            Interception::PassThrough
        }
    }
}

impl Default for HaltInterceptor {
    fn default() -> Self {
        Self::new(DEFAULT_HALT_MARKER, DEFAULT_QUIT_EXCLUSION)
    }
}
