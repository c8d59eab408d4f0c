//! Child process execution.
//!
//! Every compiler, archiver and test-binary invocation goes through a
//! [`CommandRunner`]. The system implementation waits for the child to
//! exit and captures both output streams in full before returning.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

use crate::command::CommandLine;
use crate::error::{HarnessError, Result};

/// Captured result of one child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the child was killed by a signal or timed out.
    pub exit_code: Option<i32>,

    /// Captured stdout.
    pub stdout: Vec<u8>,

    /// Captured stderr.
    pub stderr: Vec<u8>,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether the child was killed for exceeding its time limit.
    pub timed_out: bool,
}

impl ProcessOutput {
    /// Whether the child exited with code 0.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Stderr decoded lossily, trailing whitespace trimmed.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim_end().to_string()
    }
}

/// Executes command lines.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `cmd` to completion. With a `timeout`, a child still running
    /// when it expires is killed and reported with `timed_out` set.
    async fn run(&self, cmd: &CommandLine, timeout: Option<Duration>) -> Result<ProcessOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, cmd: &CommandLine, timeout: Option<Duration>) -> Result<ProcessOutput> {
        cmd.validate()?;
        let start = Instant::now();

        let mut command = Command::new(cmd.program());
        command
            .args(cmd.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cmd.get_current_dir() {
            command.current_dir(dir);
        }

        debug!(command = %cmd, "spawning");
        let child = command.spawn().map_err(|source| HarnessError::Spawn {
            program: cmd.program_name(),
            source,
        })?;

        let waited = match timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    // Dropping the wait future drops the child, which kills it.
                    return Ok(ProcessOutput {
                        exit_code: None,
                        stdout: Vec::new(),
                        stderr: Vec::new(),
                        duration_ms: start.elapsed().as_millis() as u64,
                        timed_out: true,
                    });
                }
            },
            None => child.wait_with_output().await,
        };

        let output = waited.map_err(|source| HarnessError::Spawn {
            program: cmd.program_name(),
            source,
        })?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
            duration_ms: start.elapsed().as_millis() as u64,
            timed_out: false,
        })
    }
}
