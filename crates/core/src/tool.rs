//! External command-line tool invocation.
//!
//! Media conversion shells out to ImageMagick, libheif and FFmpeg. Every call
//! goes through [`run_tool`], which bounds the run with a timeout and kills the
//! child process when the timeout fires or the calling future is dropped.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Tail of stderr kept in [`ToolError::ExecutionFailed`]. FFmpeg prints its
/// banner first and the actual failure last.
const MAX_STDERR_BYTES: usize = 4 * 1024;

const READ_CHUNK_BYTES: usize = 1024;

/// Timeout used when probing whether a tool is installed.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for external tool invocations.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{program} binary not found: {source}")]
    NotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{program} timed out after {elapsed_ms}ms")]
    Timeout { program: String, elapsed_ms: u64 },

    #[error("{program} exited successfully but produced no output")]
    MissingOutput { program: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Whether the failure says something about the environment (missing
    /// binary, hung process, disk trouble) rather than about the input file.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            ToolError::NotFound { .. } | ToolError::Timeout { .. } | ToolError::Io(_)
        )
    }
}

/// Run `program` with `args`, failing if it exits non-zero or outlives `timeout`.
///
/// stdin and stdout are discarded; stderr is captured for error reporting.
pub async fn run_tool<I, S>(program: &str, args: I, timeout: Duration) -> Result<(), ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    // `kill_on_drop(true)` ensures the child is killed when dropped (e.g. on timeout).
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ToolError::NotFound {
                program: program.to_string(),
                source,
            }
        } else {
            ToolError::Io(source)
        }
    })?;

    // Drain stderr concurrently so a chatty tool never blocks on a full pipe.
    let stderr_task = tokio::spawn(read_tail(child.stderr.take()));

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => {
            let stderr = stderr_task.await.unwrap_or_default();
            Err(ToolError::ExecutionFailed {
                program: program.to_string(),
                exit_code: status.code(),
                stderr: stderr_tail(&stderr),
            })
        }
        Ok(Err(e)) => Err(ToolError::Io(e)),
        // `child` is dropped on return and killed with it.
        Err(_elapsed) => Err(ToolError::Timeout {
            program: program.to_string(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        }),
    }
}

/// Check whether `program` is installed by running it with a version flag.
pub async fn is_available(program: &str, version_arg: &str) -> bool {
    run_tool(program, [version_arg], PROBE_TIMEOUT).await.is_ok()
}

/// Read a stream to its end, keeping at most the last [`MAX_STDERR_BYTES`]
/// bytes (plus one read chunk while the buffer is compacted).
async fn read_tail<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut tail = Vec::new();
    let Some(mut handle) = handle else {
        return tail;
    };

    let mut chunk = [0u8; READ_CHUNK_BYTES];
    loop {
        match handle.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                tail.extend_from_slice(&chunk[..n]);
                if tail.len() > MAX_STDERR_BYTES * 2 {
                    tail.drain(..tail.len() - MAX_STDERR_BYTES);
                }
            }
        }
    }

    let start = tail.len().saturating_sub(MAX_STDERR_BYTES);
    tail.split_off(start)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(MAX_STDERR_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
