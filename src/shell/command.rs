//! Buffered command execution with a bounded output budget.

use crate::error::{McpError, Result};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const READ_CHUNK: usize = 8 * 1024;
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A program and its argument tokens.
///
/// Arguments are passed to the OS verbatim; no shell is involved, so paths
/// with spaces need no quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
}

impl Invocation {
    /// Create an invocation with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build an invocation from a token list (`tokens[0]` is the program).
    pub fn from_tokens<I, S>(tokens: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = tokens.into_iter().map(Into::into);
        let program = iter.next()?;
        Some(Self {
            program,
            args: iter.collect(),
        })
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// All tokens including the program.
    pub fn tokens(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    pub(crate) fn to_command(&self, options: &CommandOptions) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &options.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration: Duration::ZERO,
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration: Duration::ZERO,
            success: false,
        }
    }

    /// Attach the measured duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Exit code as an integer; signal termination maps to `-1`.
    pub fn code(&self) -> i32 {
        self.exit_code.unwrap_or(-1)
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Maximum combined stdout+stderr bytes (None = unbounded).
    pub max_output_bytes: Option<usize>,
}

impl CommandOptions {
    /// Options with only a working directory set.
    pub fn in_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            ..Default::default()
        }
    }

    /// Set the output bound.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.max_output_bytes = Some(limit);
        self
    }

    /// Add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Execute a command, capturing its output.
///
/// A non-zero exit is returned as a failed [`CommandResult`], never as an
/// error. Errors are reserved for spawn failures and for output exceeding
/// `max_output_bytes`, in which case the child is killed.
pub fn execute(invocation: &Invocation, options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();
    let command_str = invocation.to_string();
    tracing::debug!("Executing: {}", command_str);

    let mut cmd = invocation.to_command(options);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| McpError::ProcessSpawnFailed {
        command: command_str.clone(),
        message: e.to_string(),
    })?;

    let limit = options.max_output_bytes.unwrap_or(usize::MAX);
    let used = Arc::new(AtomicUsize::new(0));
    let exceeded = Arc::new(AtomicBool::new(false));

    let stdout_handle = child
        .stdout
        .take()
        .map(|pipe| drain_bounded(pipe, Arc::clone(&used), Arc::clone(&exceeded), limit));
    let stderr_handle = child
        .stderr
        .take()
        .map(|pipe| drain_bounded(pipe, Arc::clone(&used), Arc::clone(&exceeded), limit));

    let waited = wait_bounded(&mut child, &exceeded, Child::try_wait);

    let stdout = join_output(stdout_handle);
    let stderr = join_output(stderr_handle);
    let status = waited?;

    let Some(status) = status.filter(|_| !exceeded.load(Ordering::SeqCst)) else {
        tracing::debug!("Output limit of {} bytes exceeded: {}", limit, command_str);
        return Err(McpError::OutputTooLarge {
            command: command_str,
            limit,
        });
    };

    let duration = start.elapsed();
    let result = if status.success() {
        CommandResult::success(stdout, stderr)
    } else {
        CommandResult::failure(status.code(), stdout, stderr)
    };
    Ok(result.with_duration(duration))
}

/// Poll `child` until it exits or the output bound is exceeded.
///
/// `None` means the child was killed for exceeding the bound. On a wait
/// error the child is killed and reaped before the error is returned, so the
/// drain threads always see their pipes close.
fn wait_bounded<W>(
    child: &mut Child,
    exceeded: &AtomicBool,
    mut try_wait: W,
) -> std::io::Result<Option<ExitStatus>>
where
    W: FnMut(&mut Child) -> std::io::Result<Option<ExitStatus>>,
{
    loop {
        if exceeded.load(Ordering::SeqCst) {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        match try_wait(child) {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        }
    }
}

/// Execute a command and return success/failure.
pub fn execute_check(invocation: &Invocation, options: &CommandOptions) -> bool {
    execute(invocation, options)
        .map(|r| r.success)
        .unwrap_or(false)
}

fn drain_bounded<R>(
    mut pipe: R,
    used: Arc<AtomicUsize>,
    exceeded: Arc<AtomicBool>,
    limit: usize,
) -> thread::JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut collected = Vec::new();
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let total = used.fetch_add(n, Ordering::SeqCst).saturating_add(n);
                    if total > limit {
                        exceeded.store(true, Ordering::SeqCst);
                        break;
                    }
                    collected.extend_from_slice(&buf[..n]);
                }
            }
        }
        collected
    })
}

fn join_output(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Invocation {
        if cfg!(target_os = "windows") {
            Invocation::new("cmd").args(["/C", script])
        } else {
            Invocation::new("sh").args(["-c", script])
        }
    }

    #[test]
    fn invocation_display_quotes_spaces() {
        let inv = Invocation::new("uv").args(["venv", "/path with space/venv"]);
        assert_eq!(inv.to_string(), "uv venv \"/path with space/venv\"");
    }

    #[test]
    fn invocation_from_tokens() {
        let inv = Invocation::from_tokens(["uv", "--version"]).unwrap();
        assert_eq!(inv.program, "uv");
        assert_eq!(inv.args, vec!["--version".to_string()]);
        assert!(Invocation::from_tokens(Vec::<String>::new()).is_none());
    }

    #[test]
    fn execute_successful_command() {
        let result = execute(&sh("echo hello"), &CommandOptions::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[test]
    fn execute_failing_command_is_not_an_error() {
        let result = execute(&sh("exit 3"), &CommandOptions::default()).unwrap();
        assert!(!result.success);
        assert_eq!(result.code(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn execute_captures_stderr() {
        let result = execute(&sh("echo oops >&2; exit 1"), &CommandOptions::default()).unwrap();
        assert!(result.stderr.contains("oops"));
        assert!(result.stdout.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn execute_with_env_and_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let options = CommandOptions::in_dir(temp.path()).with_env("MY_VAR", "my_value");
        let result = execute(&sh("echo $MY_VAR; pwd"), &options).unwrap();
        assert!(result.stdout.contains("my_value"));
        let dir_name = temp.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(result.stdout.contains(&dir_name));
    }

    #[cfg(unix)]
    #[test]
    fn output_over_limit_fails_instead_of_truncating() {
        let options = CommandOptions::default().with_limit(64);
        let err = execute(&sh("yes abcdefgh | head -c 100000"), &options).unwrap_err();
        assert!(matches!(err, McpError::OutputTooLarge { limit: 64, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn output_under_limit_succeeds() {
        let options = CommandOptions::default().with_limit(1024);
        let result = execute(&sh("echo small"), &options).unwrap();
        assert!(result.success);
    }

    #[test]
    fn spawn_failure_is_reported() {
        let inv = Invocation::new("definitely-not-a-real-program-ifs-mcp");
        let err = execute(&inv, &CommandOptions::default()).unwrap_err();
        assert!(matches!(err, McpError::ProcessSpawnFailed { .. }));
    }

    #[test]
    fn execute_check_returns_bool() {
        assert!(execute_check(&sh("exit 0"), &CommandOptions::default()));
        assert!(!execute_check(&sh("exit 1"), &CommandOptions::default()));
    }

    #[cfg(unix)]
    #[test]
    fn wait_error_kills_the_child() {
        let mut child = Command::new("sleep")
            .arg("30")
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let exceeded = AtomicBool::new(false);

        let err = wait_bounded(&mut child, &exceeded, |_| {
            Err(std::io::Error::other("wait failed"))
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "wait failed");
        let status = child.try_wait().unwrap();
        assert!(status.is_some_and(|s| !s.success()));
    }
}
