//! Scripted process runner for testing.
//!
//! `MockRunner` implements [`ProcessRunner`] without touching the operating
//! system. Rules map a substring of the rendered command line to a canned
//! [`CommandResult`] or a closure; every call is recorded for assertion.
//!
//! # Example
//!
//! ```
//! use ifs_mcp::shell::{CommandOptions, Invocation, MockRunner, ProcessRunner};
//!
//! let mut runner = MockRunner::new();
//! runner.on_ok("uv --version", "uv 0.5.0");
//!
//! let result = runner
//!     .run(&Invocation::new("uv").arg("--version"), &CommandOptions::default())
//!     .unwrap();
//! assert!(result.success);
//! assert_eq!(runner.count("--version"), 1);
//! ```

use std::path::PathBuf;
use std::sync::Mutex;

use super::command::{CommandOptions, CommandResult, Invocation};
use super::process::ProcessHandle;
use super::runner::{ProcessRunner, SystemRunner};
use crate::error::{McpError, Result};

type Responder = Box<dyn Fn(&Invocation, &CommandOptions) -> Result<CommandResult> + Send + Sync>;

struct Rule {
    pattern: String,
    responder: Responder,
}

/// A call observed by [`MockRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Rendered command line.
    pub line: String,
    /// Working directory the call was made with.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables, sorted by key.
    pub env: Vec<(String, String)>,
    /// Whether this was a streamed spawn rather than a buffered call.
    pub spawned: bool,
}

/// Scripted [`ProcessRunner`].
///
/// Rules registered later take precedence over earlier ones. A buffered call
/// matching no rule exits 127 with "command not found", which is what a
/// missing program looks like to callers that probe.
#[derive(Default)]
pub struct MockRunner {
    rules: Vec<Rule>,
    spawn_substitute: Option<Invocation>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl std::fmt::Debug for MockRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRunner")
            .field(
                "rules",
                &self.rules.iter().map(|r| &r.pattern).collect::<Vec<_>>(),
            )
            .field("spawn_substitute", &self.spawn_substitute)
            .finish()
    }
}

impl MockRunner {
    /// Create a runner with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to matching calls with a fixed result.
    pub fn on(&mut self, pattern: &str, result: CommandResult) -> &mut Self {
        self.on_with(pattern, move |_, _| Ok(result.clone()))
    }

    /// Respond to matching calls with exit 0 and the given stdout.
    pub fn on_ok(&mut self, pattern: &str, stdout: &str) -> &mut Self {
        self.on(pattern, CommandResult::success(stdout, ""))
    }

    /// Respond to matching calls with a non-zero exit and the given stderr.
    pub fn on_fail(&mut self, pattern: &str, code: i32, stderr: &str) -> &mut Self {
        self.on(pattern, CommandResult::failure(Some(code), "", stderr))
    }

    /// Respond to matching calls with a closure, for side effects such as
    /// creating files the real program would have written.
    pub fn on_with<F>(&mut self, pattern: &str, responder: F) -> &mut Self
    where
        F: Fn(&Invocation, &CommandOptions) -> Result<CommandResult> + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            responder: Box::new(responder),
        });
        self
    }

    /// Make matching calls fail with the error the closure builds.
    pub fn on_error<F>(&mut self, pattern: &str, error: F) -> &mut Self
    where
        F: Fn() -> McpError + Send + Sync + 'static,
    {
        self.on_with(pattern, move |_, _| Err(error()))
    }

    /// Run this real program whenever a spawn is requested.
    ///
    /// Without a substitute, spawns fail with `ProcessSpawnFailed`.
    pub fn set_spawn_substitute(&mut self, invocation: Invocation) {
        self.spawn_substitute = Some(invocation);
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock_calls().clone()
    }

    /// Rendered command lines of all recorded calls, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lock_calls().iter().map(|c| c.line.clone()).collect()
    }

    /// Number of recorded calls whose command line contains `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.lock_calls()
            .iter()
            .filter(|c| c.line.contains(pattern))
            .count()
    }

    /// Whether any recorded call contains `pattern`.
    pub fn was_called(&self, pattern: &str) -> bool {
        self.count(pattern) > 0
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<RecordedCall>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, invocation: &Invocation, options: &CommandOptions, spawned: bool) -> String {
        let line = invocation.to_string();
        let mut env: Vec<(String, String)> = options
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        env.sort();
        self.lock_calls().push(RecordedCall {
            line: line.clone(),
            cwd: options.cwd.clone(),
            env,
            spawned,
        });
        line
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, invocation: &Invocation, options: &CommandOptions) -> Result<CommandResult> {
        let line = self.record(invocation, options, false);
        match self.rules.iter().rev().find(|r| line.contains(&r.pattern)) {
            Some(rule) => (rule.responder)(invocation, options),
            None => Ok(CommandResult::failure(
                Some(127),
                "",
                format!("{}: command not found", invocation.program),
            )),
        }
    }

    fn spawn(&self, invocation: &Invocation, options: &CommandOptions) -> Result<ProcessHandle> {
        let line = self.record(invocation, options, true);
        match &self.spawn_substitute {
            Some(substitute) => SystemRunner.spawn(substitute, &CommandOptions::default()),
            None => Err(McpError::ProcessSpawnFailed {
                command: line,
                message: "no spawn substitute configured".to_string(),
            }),
        }
    }
}
