//! Long-lived child processes with independently drained stdio.

use crate::error::Result;
use std::io;
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

const TERMINATE_POLL: Duration = Duration::from_millis(50);

/// Handle to a spawned process that is not waited on at spawn time.
///
/// The three stdio pipes are handed out separately so each can be drained
/// on its own thread. Consumers must be attached before the child fills a
/// pipe buffer, or it will block on write.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    command: String,
    exit_status: Option<ExitStatus>,
    terminated: bool,
}

impl ProcessHandle {
    pub(crate) fn new(child: Child, command: String) -> Self {
        Self {
            child,
            command,
            exit_status: None,
            terminated: false,
        }
    }

    /// OS process id.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// The command line that started this process.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Take the stdin writer. Returns `None` after the first call.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// Take the stdout reader. Returns `None` after the first call.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take the stderr reader. Returns `None` after the first call.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Exit code once the process has exited (None while running or when
    /// killed by a signal).
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_status.and_then(|s| s.code())
    }

    /// Whether [`terminate`](Self::terminate) has run on this handle.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Non-blocking liveness check.
    pub fn is_alive(&mut self) -> bool {
        if self.exit_status.is_some() {
            return false;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exit_status = Some(status);
                false
            }
            Ok(None) => true,
            Err(e) => {
                tracing::warn!("Could not query process {}: {}", self.pid(), e);
                false
            }
        }
    }

    /// Block until the process exits.
    pub fn wait(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }
        let status = self.child.wait()?;
        self.exit_status = Some(status);
        Ok(status)
    }

    /// Two-phase shutdown: ask politely, wait up to `grace`, then kill.
    ///
    /// Returns `true` when the process exited within the grace period.
    pub fn terminate(&mut self, grace: Duration) -> Result<bool> {
        self.terminated = true;
        if !self.is_alive() {
            return Ok(true);
        }

        tracing::debug!("Requesting termination of pid {}", self.pid());
        request_termination(&mut self.child)?;

        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if !self.is_alive() {
                return Ok(true);
            }
            thread::sleep(TERMINATE_POLL);
        }

        if self.is_alive() {
            tracing::info!(
                "Process {} still alive after {:?}, killing",
                self.pid(),
                grace
            );
            match self.child.kill() {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
                Err(e) => return Err(e.into()),
            }
            self.wait()?;
            return Ok(false);
        }
        Ok(true)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if self.is_alive() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(unix)]
fn request_termination(child: &mut Child) -> io::Result<()> {
    let pid = child.id() as libc::pid_t;
    // SAFETY: sending a signal to a pid we spawned and have not reaped.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) -> io::Result<()> {
    // No graceful signal on this platform; the grace wait still applies to
    // the exit that follows.
    match child.kill() {
        Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
        other => other,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::process::{Command, Stdio};

    fn spawn(script: &str) -> ProcessHandle {
        let child = Command::new("sh")
            .args(["-c", script])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        ProcessHandle::new(child, script.to_string())
    }

    #[test]
    fn terminate_stops_sleeping_process_gracefully() {
        let mut handle = spawn("sleep 30");
        assert!(handle.is_alive());
        let graceful = handle.terminate(Duration::from_secs(2)).unwrap();
        assert!(graceful);
        assert!(!handle.is_alive());
        assert!(handle.is_terminated());
    }

    #[test]
    fn terminate_force_kills_after_grace() {
        let mut handle = spawn("trap '' TERM; sleep 30");
        thread::sleep(Duration::from_millis(100));
        let graceful = handle.terminate(Duration::from_millis(200)).unwrap();
        assert!(!graceful);
        assert!(!handle.is_alive());
    }

    #[test]
    fn terminate_on_exited_process_is_noop() {
        let mut handle = spawn("exit 4");
        handle.wait().unwrap();
        assert_eq!(handle.exit_code(), Some(4));
        assert!(handle.terminate(Duration::from_millis(10)).unwrap());
    }

    #[test]
    fn stdio_pipes_are_independent() {
        let mut handle = spawn("read line; echo \"out:$line\"; echo err >&2");
        let mut stdin = handle.take_stdin().unwrap();
        let stdout = handle.take_stdout().unwrap();
        let stderr = handle.take_stderr().unwrap();
        assert!(handle.take_stdout().is_none());

        writeln!(stdin, "ping").unwrap();
        drop(stdin);

        let mut out = String::new();
        BufReader::new(stdout).read_line(&mut out).unwrap();
        let mut err = String::new();
        BufReader::new(stderr).read_line(&mut err).unwrap();

        assert_eq!(out.trim(), "out:ping");
        assert_eq!(err.trim(), "err");
        assert!(handle.wait().unwrap().success());
    }
}
