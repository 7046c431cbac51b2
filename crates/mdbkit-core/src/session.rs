//! Debugger session: process ownership plus the send/receive transaction
//! primitive every command is built on.
//!
//! A session allows one outstanding command at a time. Every I/O method takes
//! `&mut self`, and the text returned by [`Session::receive`] borrows the
//! session's response buffer, so it cannot outlive the next call.

use std::time::Duration;

use regex::bytes::Regex;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::{MdbError, MdbResult};
use crate::framing::{
    compile_pattern, decode, FrameBuffer, DEFAULT_HALTED_PATTERN, DEFAULT_PROMPT,
};
use crate::intercept::{
    HaltInterceptor, Interception, DEFAULT_HALT_MARKER, DEFAULT_QUIT_EXCLUSION,
};
use crate::supervisor::{self, DebuggerProcess};

/// Default debugger executable.
pub const DEFAULT_EXECUTABLE: &str = "mdb";

/// Writable command channel into the debugger.
pub type CommandSink = Box<dyn AsyncWrite + Send + Unpin>;

/// Lifecycle state of a debugger session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The session has been closed; no further I/O is possible.
    Dead,
    /// The target is executing.
    Running,
    /// The target is halted and accepts inspection commands.
    Stopped,
    /// The debugger is executing a `Sleep`/`Wait` command.
    Sleeping,
}

/// How to launch and frame a debugger.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Executable to launch.
    pub executable: String,
    /// Command-line arguments.
    pub args: Vec<String>,
    /// Pattern that ends every response.
    pub prompt: String,
    /// Pattern that ends the acknowledgement following a halt notice.
    pub halted_pattern: String,
    /// Substring announcing an asynchronous halt.
    pub halt_marker: String,
    /// Substring that suppresses halt interception.
    pub quit_exclusion: String,
    /// Default deadline for each receive; `None` waits forever.
    pub receive_timeout: Option<Duration>,
}

impl SessionConfig {
    /// Default configuration for a given executable.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            args: Vec::new(),
            prompt: DEFAULT_PROMPT.to_string(),
            halted_pattern: DEFAULT_HALTED_PATTERN.to_string(),
            halt_marker: DEFAULT_HALT_MARKER.to_string(),
            quit_exclusion: DEFAULT_QUIT_EXCLUSION.to_string(),
            receive_timeout: None,
        }
    }
}

/// Which pattern ends the frame being read.
#[derive(Debug, Clone, Copy)]
enum Delimiter {
    Prompt,
    Halted,
}

/// An interactive debugger session.
pub struct Session {
    state: SessionState,
    process: Option<DebuggerProcess>,
    input: Option<CommandSink>,
    output: Option<mpsc::Receiver<Vec<u8>>>,
    frames: FrameBuffer,
    response: String,
    prompt: Regex,
    halted: Regex,
    interceptor: HaltInterceptor,
    receive_timeout: Option<Duration>,
    frames_read: u64,
}

impl Session {
    /// Launch the configured debugger and consume its startup banner.
    pub async fn spawn(config: &SessionConfig) -> MdbResult<Self> {
        // Compile patterns first so a bad config never leaves a stray process.
        let (prompt, halted) = compile_patterns(config)?;
        let spawned = supervisor::spawn(&config.executable, &config.args)?;
        let session = Self::assemble(
            config,
            prompt,
            halted,
            Some(spawned.process),
            Box::new(spawned.input),
            spawned.output,
        );
        session.consume_banner().await
    }

    /// Build a session over existing channels instead of a child process.
    ///
    /// `output` yields raw chunks of debugger output. The startup banner is
    /// consumed before returning, exactly as with [`Session::spawn`].
    pub async fn from_channels(
        config: &SessionConfig,
        input: CommandSink,
        output: mpsc::Receiver<Vec<u8>>,
    ) -> MdbResult<Self> {
        let (prompt, halted) = compile_patterns(config)?;
        let session = Self::assemble(config, prompt, halted, None, input, output);
        session.consume_banner().await
    }

    fn assemble(
        config: &SessionConfig,
        prompt: Regex,
        halted: Regex,
        process: Option<DebuggerProcess>,
        input: CommandSink,
        output: mpsc::Receiver<Vec<u8>>,
    ) -> Self {
        Self {
            state: SessionState::Stopped,
            process,
            input: Some(input),
            output: Some(output),
            frames: FrameBuffer::new(),
            response: String::new(),
            prompt,
            halted,
            interceptor: HaltInterceptor::new(&config.halt_marker, &config.quit_exclusion),
            receive_timeout: config.receive_timeout,
            frames_read: 0,
        }
    }

    async fn consume_banner(mut self) -> MdbResult<Self> {
        let banner = self.receive().await.map(str::len);
        match banner {
            Ok(bytes) => {
                tracing::debug!(bytes, "startup banner consumed");
                Ok(self)
            }
            Err(e) => {
                // The half-built session never reaches the caller.
                if let Err(close_err) = self.terminate().await {
                    tracing::warn!(error = %close_err, "cleanup after failed startup");
                }
                Err(e)
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// OS process id of the debugger, when backed by a live process.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(DebuggerProcess::id)
    }

    /// The most recent response.
    pub fn last_response(&self) -> &str {
        &self.response
    }

    /// Number of frames read from the output stream so far, including the
    /// banner and any frames consumed while resynchronizing after a halt.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Default receive deadline.
    pub fn receive_timeout(&self) -> Option<Duration> {
        self.receive_timeout
    }

    /// Change the default receive deadline.
    pub fn set_receive_timeout(&mut self, timeout: Option<Duration>) {
        self.receive_timeout = timeout;
    }

    /// Move to `to` unless the session is already closed.
    ///
    /// Used by the command layer: continue-style commands enter `Running`
    /// before they are sent, `halt` enters `Stopped` after it completes.
    pub(crate) fn transition(&mut self, to: SessionState) {
        if self.state != SessionState::Dead && to != SessionState::Dead {
            tracing::trace!(from = ?self.state, ?to, "session state");
            self.state = to;
        }
    }

    /// Write one command line. A trailing newline is added if missing.
    pub async fn send(&mut self, text: &str) -> MdbResult<()> {
        let input = self.input.as_mut().ok_or(MdbError::Closed)?;

        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        if !line.ends_with('\n') {
            line.push('\n');
        }
        tracing::debug!(command = line.trim_end(), "send");

        let bytes = line.as_bytes();
        let mut written = 0;
        while written < bytes.len() {
            match input.write(&bytes[written..]).await {
                Ok(0) => {
                    return Err(MdbError::Send(std::io::Error::new(
                        std::io::ErrorKind::WriteZero,
                        "debugger input accepted no bytes",
                    )))
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(MdbError::Send(e)),
            }
        }
        input.flush().await.map_err(MdbError::Send)
    }

    /// Read the next response using the session's default deadline.
    pub async fn receive(&mut self) -> MdbResult<&str> {
        self.receive_within(self.receive_timeout).await
    }

    /// Read the next response, giving up after `deadline` if one is given.
    ///
    /// If the frame announces an asynchronous halt, the `HALTED`
    /// acknowledgement is consumed and the frame after it is returned
    /// instead, with the state moved to [`SessionState::Stopped`]. The
    /// deadline covers all three reads.
    pub async fn receive_within(&mut self, deadline: Option<Duration>) -> MdbResult<&str> {
        let deadline = deadline.map(|d| (Instant::now() + d, d));
        self.response.clear();

        let mut text = self.read_frame(Delimiter::Prompt, deadline).await?;
        if self.interceptor.inspect(&text) == Interception::Halt {
            tracing::warn!(marker = self.interceptor.marker(), "halt notice; resynchronizing");
            self.state = SessionState::Stopped;
            let ack = self.read_frame(Delimiter::Halted, deadline).await?;
            tracing::debug!(bytes = ack.len(), "halt acknowledgement discarded");
            text = self.read_frame(Delimiter::Prompt, deadline).await?;
        }

        self.response = text;
        Ok(&self.response)
    }

    /// Send `text` and return its response.
    pub async fn transact(&mut self, text: &str) -> MdbResult<&str> {
        self.send(text).await?;
        self.receive().await
    }

    /// Send `text` and return its response, with an explicit deadline.
    pub async fn transact_within(
        &mut self,
        text: &str,
        deadline: Option<Duration>,
    ) -> MdbResult<&str> {
        self.send(text).await?;
        self.receive_within(deadline).await
    }

    async fn read_frame(
        &mut self,
        delimiter: Delimiter,
        deadline: Option<(Instant, Duration)>,
    ) -> MdbResult<String> {
        let pattern = match delimiter {
            Delimiter::Prompt => &self.prompt,
            Delimiter::Halted => &self.halted,
        };
        let output = self.output.as_mut().ok_or(MdbError::Closed)?;

        loop {
            if let Some(frame) = self.frames.take_frame(pattern) {
                self.frames_read += 1;
                tracing::debug!(?delimiter, bytes = frame.len(), "frame received");
                return Ok(decode(&frame));
            }

            let chunk = match deadline {
                None => output.recv().await,
                Some((at, limit)) => tokio::time::timeout_at(at, output.recv())
                    .await
                    .map_err(|_| MdbError::Timeout(limit))?,
            };

            match chunk {
                Some(chunk) => self.frames.push(&chunk),
                None => {
                    let partial = decode(&self.frames.take_all());
                    tracing::warn!(bytes = partial.len(), "debugger output closed mid-response");
                    return Err(MdbError::Receive { partial });
                }
            }
        }
    }

    /// Close the debugger's input and wait for it to exit.
    ///
    /// Calling this on a closed session does nothing.
    pub async fn close(&mut self) -> MdbResult<()> {
        if self.state == SessionState::Dead {
            return Ok(());
        }
        self.release(false).await
    }

    /// Kill the debugger process and wait for it to exit.
    ///
    /// This is the only way to abandon a transaction that has no deadline.
    /// Calling this on a closed session does nothing.
    pub async fn terminate(&mut self) -> MdbResult<()> {
        if self.state == SessionState::Dead {
            return Ok(());
        }
        self.release(true).await
    }

    async fn release(&mut self, kill: bool) -> MdbResult<()> {
        self.state = SessionState::Dead;
        let input = self.input.take();
        let mut process = self.process.take();

        let mut result = Ok(());
        if let Some(mut input) = input {
            if let Err(e) = input.shutdown().await {
                tracing::debug!(error = %e, "closing debugger input");
            }
        }
        if kill {
            if let Some(process) = process.as_mut() {
                result = process.start_kill();
            }
        }
        // Keep draining output until exit so a chatty debugger cannot block
        // on a full pipe while we wait for it.
        let output = self.output.take();
        if let Some(process) = process {
            let (status, discarded) = tokio::join!(process.wait(), drain(output));
            if discarded > 0 {
                tracing::debug!(bytes = discarded, "output discarded during shutdown");
            }
            match status {
                Ok(status) => tracing::info!(%status, "debugger exited"),
                Err(e) => result = result.and(Err(e)),
            }
        }

        self.frames = FrameBuffer::new();
        self.response.clear();
        result
    }
}

/// Consume `output` until every sender is gone, returning the byte count.
async fn drain(output: Option<mpsc::Receiver<Vec<u8>>>) -> usize {
    let Some(mut output) = output else {
        return 0;
    };
    let mut total = 0;
    while let Some(chunk) = output.recv().await {
        total += chunk.len();
    }
    total
}

fn compile_patterns(config: &SessionConfig) -> MdbResult<(Regex, Regex)> {
    Ok((
        compile_pattern(&config.prompt)?,
        compile_pattern(&config.halted_pattern)?,
    ))
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("pid", &self.pid())
            .field("frames_read", &self.frames_read)
            .field("interceptor", &self.interceptor)
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state != SessionState::Dead {
            tracing::warn!(pid = ?self.pid(), "session dropped without close()");
        }
    }
}
