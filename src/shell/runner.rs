//! The seam between orchestration code and real processes.

use super::command::{execute, execute_check, CommandOptions, CommandResult, Invocation};
use super::process::ProcessHandle;
use crate::error::{McpError, Result};
use std::process::Stdio;

/// Runs external programs.
///
/// Everything above the shell layer goes through this trait, so tests can
/// substitute [`MockRunner`](super::MockRunner) and never need the real
/// toolchain on the machine.
pub trait ProcessRunner: Send + Sync {
    /// Buffered call. Non-zero exits are returned, not raised.
    fn run(&self, invocation: &Invocation, options: &CommandOptions) -> Result<CommandResult>;

    /// Start a process with all three stdio streams piped and return
    /// without waiting for it.
    fn spawn(&self, invocation: &Invocation, options: &CommandOptions) -> Result<ProcessHandle>;

    /// Whether the invocation can be started and exits 0.
    fn probe(&self, invocation: &Invocation) -> bool {
        self.run(invocation, &CommandOptions::default())
            .map(|r| r.success)
            .unwrap_or(false)
    }
}

/// [`ProcessRunner`] backed by `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation, options: &CommandOptions) -> Result<CommandResult> {
        execute(invocation, options)
    }

    fn spawn(&self, invocation: &Invocation, options: &CommandOptions) -> Result<ProcessHandle> {
        let command_str = invocation.to_string();
        tracing::debug!("Spawning: {}", command_str);

        let mut cmd = invocation.to_command(options);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| McpError::ProcessSpawnFailed {
            command: command_str.clone(),
            message: e.to_string(),
        })?;
        Ok(ProcessHandle::new(child, command_str))
    }

    fn probe(&self, invocation: &Invocation) -> bool {
        execute_check(invocation, &CommandOptions::default())
    }
}
