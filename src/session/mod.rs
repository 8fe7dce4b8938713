//! The long-lived MCP server and the session that owns it.
//!
//! A [`ServerSession`] holds at most one server process. Starting a second
//! one while the first is alive is rejected before anything is spawned.
//! Stopping is two-phase: a termination request, a grace period, then a
//! forced kill.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::bridge::CommandBridge;
use crate::config::Settings;
use crate::error::{McpError, Result};
use crate::shell::ProcessHandle;

const COPY_CHUNK: usize = 8 * 1024;

/// Arguments that identify and configure the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub name: String,
    pub log_level: String,
    pub grace: Duration,
}

impl ServerOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            name: settings.server_name.clone(),
            log_level: settings.log_level.clone(),
            grace: settings.shutdown_grace(),
        }
    }

    fn server_args<'a>(&'a self, version: &'a str) -> [&'a str; 8] {
        [
            "--version",
            version,
            "--name",
            self.name.as_str(),
            "--transport",
            "stdio",
            "--log-level",
            self.log_level.as_str(),
        ]
    }
}

/// A server started by this session.
#[derive(Debug)]
pub struct RunningServer {
    handle: ProcessHandle,
    version: String,
    started_at: DateTime<Utc>,
    // Held open so the stdio transport does not see EOF.
    _stdin: Option<std::process::ChildStdin>,
}

impl RunningServer {
    pub fn pid(&self) -> u32 {
        self.handle.pid()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Owns the server role for one host session.
#[derive(Debug)]
pub struct ServerSession {
    bridge: CommandBridge,
    options: ServerOptions,
    server: Option<RunningServer>,
}

impl ServerSession {
    pub fn new(bridge: CommandBridge, options: ServerOptions) -> Self {
        Self {
            bridge,
            options,
            server: None,
        }
    }

    pub fn bridge(&self) -> &CommandBridge {
        &self.bridge
    }

    /// Whether a server started by this session is still alive.
    ///
    /// A server found dead is forgotten.
    pub fn is_alive(&mut self) -> bool {
        let alive = self
            .server
            .as_mut()
            .map(|s| s.handle.is_alive())
            .unwrap_or(false);
        if !alive {
            if let Some(server) = self.server.take() {
                tracing::info!(
                    "MCP server (pid {}) exited with {:?}",
                    server.pid(),
                    server.handle.exit_code()
                );
            }
        }
        alive
    }

    /// The running server, if any.
    pub fn running(&mut self) -> Option<&RunningServer> {
        if self.is_alive() {
            self.server.as_ref()
        } else {
            None
        }
    }

    /// Check that the tool's CLI starts at all.
    pub fn preflight(&self) -> Result<()> {
        self.bridge.run_checked("--help", &[]).map(|_| ())
    }

    fn ensure_not_running(&mut self) -> Result<()> {
        if self.is_alive() {
            if let Some(server) = &self.server {
                return Err(McpError::ServerAlreadyRunning { pid: server.pid() });
            }
        }
        Ok(())
    }

    /// Start the server in the background for `version`.
    ///
    /// Output is drained on background threads and forwarded to the log.
    pub fn start(&mut self, version: &str, cwd: &Path) -> Result<u32> {
        self.ensure_not_running()?;
        self.preflight()?;

        let mut handle = self.bridge.spawn_long_running(
            "server",
            &self.options.server_args(version),
            cwd,
        )?;
        let stdin = handle.take_stdin();
        if let Some(stdout) = handle.take_stdout() {
            forward_lines(stdout, "stdout");
        }
        if let Some(stderr) = handle.take_stderr() {
            forward_lines(stderr, "stderr");
        }

        let pid = handle.pid();
        tracing::info!("MCP server started for version {} (pid {})", version, pid);
        self.server = Some(RunningServer {
            handle,
            version: version.to_string(),
            started_at: Utc::now(),
            _stdin: stdin,
        });
        Ok(pid)
    }

    /// Stop the running server. Returns `true` when it exited within the
    /// grace period.
    pub fn stop(&mut self) -> Result<bool> {
        if !self.is_alive() {
            return Err(McpError::ServerNotRunning);
        }
        let Some(mut server) = self.server.take() else {
            return Err(McpError::ServerNotRunning);
        };
        let graceful = server.handle.terminate(self.options.grace)?;
        tracing::info!(
            "MCP server (pid {}) stopped{}",
            server.pid(),
            if graceful { "" } else { " after force kill" }
        );
        Ok(graceful)
    }

    /// Run the server in the foreground, bridging raw bytes between
    /// `input`/`output` and the server's stdio until it exits.
    ///
    /// Framing is not parsed. Server stderr goes to the log.
    pub fn serve<R, W>(
        &mut self,
        version: &str,
        cwd: &Path,
        input: R,
        output: &mut W,
    ) -> Result<Option<i32>>
    where
        R: Read + Send + 'static,
        W: Write,
    {
        self.ensure_not_running()?;
        self.preflight()?;

        let mut handle = self.bridge.spawn_long_running(
            "server",
            &self.options.server_args(version),
            cwd,
        )?;
        tracing::info!(
            "MCP server serving version {} on stdio (pid {})",
            version,
            handle.pid()
        );

        if let Some(stderr) = handle.take_stderr() {
            forward_lines(stderr, "stderr");
        }
        if let Some(mut stdin) = handle.take_stdin() {
            thread::spawn(move || {
                let mut input = input;
                let _ = std::io::copy(&mut input, &mut stdin);
            });
        }
        if let Some(mut stdout) = handle.take_stdout() {
            let mut buf = [0u8; COPY_CHUNK];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                output.write_all(&buf[..n])?;
                output.flush()?;
            }
        }

        let status = handle.wait()?;
        tracing::info!("MCP server exited with {:?}", status.code());
        Ok(status.code())
    }
}

impl Drop for ServerSession {
    fn drop(&mut self) {
        if let Some(mut server) = self.server.take() {
            if let Err(e) = server.handle.terminate(self.options.grace) {
                tracing::warn!("Failed to stop MCP server on exit: {}", e);
            }
        }
    }
}

fn forward_lines<R: Read + Send + 'static>(pipe: R, stream: &'static str) {
    thread::spawn(move || {
        let span = tracing::info_span!("server", stream);
        let _enter = span.enter();
        for line in BufReader::new(pipe).lines() {
            match line {
                Ok(line) => tracing::info!("{}", line),
                Err(_) => break,
            }
        }
    });
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::AppPaths;
    use crate::shell::{Invocation, MockRunner};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn session(temp: &TempDir, substitute: &[&str]) -> (ServerSession, Arc<MockRunner>) {
        let root = temp.path().join("server");
        std::fs::create_dir_all(&root).unwrap();

        let mut runner = MockRunner::new();
        runner.on_ok("uv --version", "uv 0.5.0");
        runner.on_ok("--help", "usage: main");
        runner.set_spawn_substitute(Invocation::from_tokens(substitute.iter().copied()).unwrap());
        let runner = Arc::new(runner);

        let bridge = CommandBridge::new(
            AppPaths::new(root, temp.path()),
            &Settings::default(),
            runner.clone(),
        );
        let options = ServerOptions {
            grace: Duration::from_millis(500),
            ..ServerOptions::from_settings(&Settings::default())
        };
        (ServerSession::new(bridge, options), runner)
    }

    #[test]
    fn start_then_stop() {
        let temp = TempDir::new().unwrap();
        let (mut session, runner) = session(&temp, &["sleep", "30"]);

        let pid = session.start("25.1.0", temp.path()).unwrap();
        assert!(session.is_alive());
        assert_eq!(session.running().unwrap().pid(), pid);
        assert_eq!(session.running().unwrap().version(), "25.1.0");

        let spawned = runner.calls().into_iter().find(|c| c.spawned).unwrap();
        assert!(spawned.line.contains(
            "server --version 25.1.0 --name ifs-cloud-mcp-server --transport stdio --log-level INFO"
        ));

        assert!(session.stop().unwrap());
        assert!(!session.is_alive());
    }

    #[test]
    fn second_start_is_rejected_without_spawning() {
        let temp = TempDir::new().unwrap();
        let (mut session, runner) = session(&temp, &["sleep", "30"]);

        let pid = session.start("25.1.0", temp.path()).unwrap();
        let err = session.start("25.1.0", temp.path()).unwrap_err();
        assert!(matches!(err, McpError::ServerAlreadyRunning { pid: p } if p == pid));
        assert_eq!(runner.calls().iter().filter(|c| c.spawned).count(), 1);
    }

    #[test]
    fn stop_without_server_fails() {
        let temp = TempDir::new().unwrap();
        let (mut session, _) = session(&temp, &["sleep", "30"]);
        assert!(matches!(session.stop(), Err(McpError::ServerNotRunning)));
    }

    #[test]
    fn failed_preflight_prevents_start() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("server");
        std::fs::create_dir_all(&root).unwrap();
        let mut runner = MockRunner::new();
        runner.on_ok("uv --version", "uv");
        runner.on_fail("--help", 1, "ModuleNotFoundError: No module named 'src'");
        let runner = Arc::new(runner);
        let bridge = CommandBridge::new(
            AppPaths::new(root, temp.path()),
            &Settings::default(),
            runner.clone(),
        );
        let mut session =
            ServerSession::new(bridge, ServerOptions::from_settings(&Settings::default()));

        assert!(matches!(
            session.start("25.1.0", temp.path()),
            Err(McpError::ToolFailed(_))
        ));
        assert!(runner.calls().iter().all(|c| !c.spawned));
    }

    #[test]
    fn exited_server_is_forgotten() {
        let temp = TempDir::new().unwrap();
        let (mut session, _) = session(&temp, &["true"]);
        session.start("25.1.0", temp.path()).unwrap();
        std::thread::sleep(Duration::from_millis(300));
        assert!(!session.is_alive());
        assert!(session.running().is_none());
        session.start("25.1.0", temp.path()).unwrap();
    }

    #[test]
    fn serve_bridges_raw_bytes() {
        let temp = TempDir::new().unwrap();
        let (mut session, _) = session(&temp, &["cat"]);

        let frame = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n".to_vec();
        let mut output = Vec::new();
        let code = session
            .serve("25.1.0", temp.path(), std::io::Cursor::new(frame.clone()), &mut output)
            .unwrap();

        assert_eq!(code, Some(0));
        assert_eq!(output, frame);
    }
}
