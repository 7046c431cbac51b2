//! Session error types.

use std::time::Duration;

use thiserror::Error;

/// Errors from debugger session operations.
#[derive(Debug, Error)]
pub enum MdbError {
    /// Debugger process failed to start.
    #[error("debugger failed to start: {command}: {source}")]
    SpawnFailed {
        /// The executable that could not be launched.
        command: String,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The output channel closed before the expected pattern was seen.
    #[error("debugger output closed before prompt ({} bytes pending)", partial.len())]
    Receive {
        /// Text captured before the channel closed.
        partial: String,
    },

    /// A receive did not complete within its deadline.
    #[error("no prompt within {0:?}")]
    Timeout(Duration),

    /// Writing a command to the debugger failed.
    #[error("failed to send command: {0}")]
    Send(#[source] std::io::Error),

    /// Waiting for the debugger process to exit failed.
    #[error("failed to wait for debugger exit: {0}")]
    Wait(#[source] std::io::Error),

    /// A prompt or marker pattern did not compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The session has already been closed.
    #[error("session already closed")]
    Closed,

    /// A response did not contain the value the command expects.
    #[error("unexpected response to `{command}`: {response:?}")]
    UnexpectedResponse {
        /// The command whose response was inspected.
        command: String,
        /// The response text.
        response: String,
    },
}

/// Convenience alias used throughout the crate.
pub type MdbResult<T> = Result<T, MdbError>;
