//! Ownership of the debugger child process.
//!
//! The child's stdout and stderr are each drained by a reader task into one
//! channel, so the session sees a single merged output stream. The channel
//! closes once both streams reach end-of-file.

use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{MdbError, MdbResult};

/// Size of each read from the child's output pipes.
const READ_CHUNK: usize = 4096;

/// Capacity of the merged output channel, in chunks.
const OUTPUT_CHANNEL_CAPACITY: usize = 64;

/// A running debugger process and the tasks draining its output.
#[derive(Debug)]
pub struct DebuggerProcess {
    child: Child,
    readers: Vec<JoinHandle<()>>,
}

/// Everything produced by a successful spawn.
#[derive(Debug)]
pub struct Spawned {
    /// Process handle.
    pub process: DebuggerProcess,
    /// Writable end of the child's stdin.
    pub input: ChildStdin,
    /// Merged stdout/stderr chunks.
    pub output: mpsc::Receiver<Vec<u8>>,
}

/// Launch `executable` with `args`, inheriting the environment.
///
/// Must be called from within a tokio runtime.
pub fn spawn(executable: &str, args: &[String]) -> MdbResult<Spawned> {
    let spawn_failed = |source| MdbError::SpawnFailed {
        command: executable.to_string(),
        source,
    };

    let mut child = Command::new(executable)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_failed)?;

    let missing =
        |what: &str| spawn_failed(std::io::Error::other(format!("could not capture {what}")));
    let input = child.stdin.take().ok_or_else(|| missing("stdin"))?;
    let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

    let (tx, output) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
    let readers = vec![
        tokio::spawn(forward(stdout, tx.clone(), "stdout")),
        tokio::spawn(forward(stderr, tx, "stderr")),
    ];

    tracing::info!(executable, pid = ?child.id(), "debugger spawned");

    Ok(Spawned {
        process: DebuggerProcess { child, readers },
        input,
        output,
    })
}

/// Copy `stream` into `tx` chunk by chunk until EOF or a read error.
async fn forward<R>(mut stream: R, tx: mpsc::Sender<Vec<u8>>, name: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).await.is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!(stream = name, error = %e, "debugger output read failed");
                break;
            }
        }
    }
    tracing::trace!(stream = name, "debugger output reader finished");
}

impl DebuggerProcess {
    /// OS process id, if the process has not been reaped yet.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Ask the OS to kill the process without waiting for it.
    pub fn start_kill(&mut self) -> MdbResult<()> {
        self.child.start_kill().map_err(MdbError::Wait)
    }

    /// Wait for the process to exit, then stop the reader tasks.
    pub async fn wait(mut self) -> MdbResult<ExitStatus> {
        let status = self.child.wait().await.map_err(MdbError::Wait);
        for reader in self.readers {
            reader.abort();
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_nonexistent_executable_fails() {
        let err = spawn("definitely-not-a-real-debugger-xyz", &[]).unwrap_err();
        match err {
            MdbError::SpawnFailed { command, .. } => {
                assert_eq!(command, "definitely-not-a-real-debugger-xyz");
            }
            other => panic!("expected SpawnFailed, got: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_and_stderr_are_merged() {
        let args = vec!["-c".to_string(), "printf out; printf err >&2".to_string()];
        let mut spawned = spawn("sh", &args).unwrap();

        let mut collected = Vec::new();
        while let Some(chunk) = spawned.output.recv().await {
            collected.extend_from_slice(&chunk);
        }
        let text = String::from_utf8(collected).unwrap();
        assert!(text.contains("out"));
        assert!(text.contains("err"));

        let status = spawned.process.wait().await.unwrap();
        assert!(status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn start_kill_terminates_process() {
        let args = vec!["-c".to_string(), "sleep 30".to_string()];
        let mut spawned = spawn("sh", &args).unwrap();
        assert!(spawned.process.id().is_some());
        spawned.process.start_kill().unwrap();
        let status = spawned.process.wait().await.unwrap();
        assert!(!status.success());
    }
}
