//! External process execution
//!
//! Every interaction with the outside world (media player, mixer, file
//! listing, tunnel agent) goes through a [`ProcessRunner`]. The runner spawns
//! one OS process per call, captures a bounded amount of stdout, and can be
//! bound to a [`CancellationToken`] so that a superseded run resolves with
//! [`ProcessError::Cancelled`] instead of a genuine failure.
//!
//! Commands are never passed through a shell: a [`CommandTemplate`] renders
//! into a program plus an argument vector, so a file path stays one argument
//! no matter which characters it contains.

use std::fmt;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Ceiling on captured stdout per run (4 MiB)
pub const MAX_OUTPUT_BYTES: usize = 4 * 1024 * 1024;

/// Captured stderr is truncated to this many bytes for error messages
const MAX_STDERR_BYTES: usize = 16 * 1024;

/// Process execution errors
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started (missing binary, permissions)
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the child's pipes or waiting on it failed
    #[error("I/O error while running process: {0}")]
    Io(#[from] std::io::Error),

    /// The program exited with a nonzero code
    #[error("'{program}' exited with code {code}: {stderr}")]
    ExitStatus {
        program: String,
        code: i32,
        stderr: String,
    },

    /// The program was killed by a signal it did not receive from us
    #[error("'{program}' terminated abnormally ({status})")]
    Signal { program: String, status: String },

    /// Stdout grew past [`MAX_OUTPUT_BYTES`]
    #[error("Output of '{program}' exceeded {limit} bytes")]
    OutputTooLarge { program: String, limit: usize },

    /// The run was aborted through its cancellation token
    #[error("Process run cancelled")]
    Cancelled,
}

impl ProcessError {
    /// True when the run ended because its token was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProcessError::Cancelled)
    }
}

/// A fully rendered command: program plus literal arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {:?}", arg)?;
        }
        Ok(())
    }
}

/// Command with `{name}` placeholders in its arguments
///
/// Configured in TOML as:
///
/// ```toml
/// [commands.player]
/// program = "mplayer"
/// args = ["{file}"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandTemplate {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandTemplate {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Substitute every `{name}` placeholder found in `vars`
    ///
    /// Unknown placeholders are left untouched. Substitution happens per
    /// argument, so a value never splits into several arguments.
    pub fn render(&self, vars: &[(&str, &str)]) -> Invocation {
        let args = self
            .args
            .iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |acc, (name, value)| {
                    acc.replace(&format!("{{{}}}", name), value)
                })
            })
            .collect();

        Invocation::new(self.program.clone(), args)
    }
}

/// Executes external commands
///
/// Implementations must resolve with [`ProcessError::Cancelled`] when
/// `cancel` fires before the process finishes.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `invocation` to completion and return its stdout
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: Option<CancellationToken>,
    ) -> Result<String, ProcessError>;
}

/// [`ProcessRunner`] backed by real OS processes
#[derive(Debug, Clone)]
pub struct SystemRunner {
    max_output: usize,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self {
            max_output: MAX_OUTPUT_BYTES,
        }
    }

    /// Override the stdout ceiling
    pub fn with_max_output(max_output: usize) -> Self {
        Self { max_output }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: Option<CancellationToken>,
    ) -> Result<String, ProcessError> {
        let program = invocation.program.clone();

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;

        debug!(command = %invocation, pid = ?child.id(), "Spawned process");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let max_output = self.max_output;

        // None means the token fired first
        let outcome = {
            let work = async {
                let (out, err) = tokio::try_join!(
                    read_stdout(stdout, max_output, &program),
                    read_stderr(stderr),
                )?;
                let status = child.wait().await?;
                Ok::<_, ProcessError>((out, err, status))
            };

            tokio::select! {
                biased;
                _ = wait_cancelled(cancel.as_ref()) => None,
                result = work => Some(result),
            }
        };

        match outcome {
            None => {
                // Already-exited children make kill() fail; nothing to do then
                let _ = child.kill().await;
                debug!(command = %invocation, "Process cancelled");
                Err(ProcessError::Cancelled)
            }
            Some(Err(e)) => {
                let _ = child.kill().await;
                Err(e)
            }
            Some(Ok((out, err, status))) => {
                check_status(&program, status, &err)?;
                Ok(String::from_utf8_lossy(&out).into_owned())
            }
        }
    }
}

async fn wait_cancelled(cancel: Option<&CancellationToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

async fn read_stdout<R>(
    reader: Option<R>,
    limit: usize,
    program: &str,
) -> Result<Vec<u8>, ProcessError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let Some(reader) = reader else {
        return Ok(buf);
    };

    // One byte past the limit is enough to detect overflow
    reader.take(limit as u64 + 1).read_to_end(&mut buf).await?;
    if buf.len() > limit {
        return Err(ProcessError::OutputTooLarge {
            program: program.to_string(),
            limit,
        });
    }
    Ok(buf)
}

async fn read_stderr<R>(reader: Option<R>) -> Result<Vec<u8>, ProcessError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let Some(mut reader) = reader else {
        return Ok(buf);
    };

    (&mut reader)
        .take(MAX_STDERR_BYTES as u64)
        .read_to_end(&mut buf)
        .await?;
    // Keep draining so a chatty child never blocks on a full pipe
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(buf)
}

fn check_status(program: &str, status: ExitStatus, stderr: &[u8]) -> Result<(), ProcessError> {
    if status.success() {
        return Ok(());
    }

    match status.code() {
        Some(code) => Err(ProcessError::ExitStatus {
            program: program.to_string(),
            code,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }),
        None => Err(ProcessError::Signal {
            program: program.to_string(),
            status: status.to_string(),
        }),
    }
}
