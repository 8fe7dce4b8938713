//! Error types for ifs-mcp operations.
//!
//! This module defines [`McpError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `McpError` for failures the caller classifies or recovers from
//! - Use `anyhow::Error` (via `McpError::Other`) for unexpected errors
//! - Non-zero exits of bridged commands are *not* errors; they come back as
//!   a [`CommandResult`](crate::shell::CommandResult) so the classifier can
//!   read their output

use std::path::PathBuf;
use thiserror::Error;

use crate::classify::StructuredError;

/// Core error type for ifs-mcp operations.
#[derive(Debug, Error)]
pub enum McpError {
    /// Neither the global nor the portable package manager could be probed.
    #[error("Package manager not found (tried: {})", .probes.join("; "))]
    EnvironmentNotFound { probes: Vec<String> },

    /// The install root does not exist.
    #[error("MCP server is not installed at {}. Run 'ifs-mcp install' first.", .root.display())]
    NotInstalled { root: PathBuf },

    /// A buffered call produced more output than the configured bound.
    #[error("Output of '{command}' exceeded {limit} bytes")]
    OutputTooLarge { command: String, limit: usize },

    /// The operating system refused to start the process.
    #[error("Failed to start '{command}': {message}")]
    ProcessSpawnFailed { command: String, message: String },

    /// A command that must succeed exited non-zero.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// A download or remote query failed.
    #[error("Network failure: {message}")]
    NetworkFailure { message: String },

    /// The requested dataset version is not known to the tool.
    #[error("Version not found: {version}")]
    VersionNotFound { version: String },

    /// The requested dataset version has not been analyzed yet.
    #[error("Version '{version}' has not been analyzed")]
    NotAnalyzed { version: String },

    /// The runtime environment could not be provisioned.
    #[error("Dependency installation failed: {message}")]
    DependencyInstallFailed { message: String },

    /// The long-lived server is already running in this session.
    #[error("MCP server is already running (pid {pid})")]
    ServerAlreadyRunning { pid: u32 },

    /// No long-lived server is running in this session.
    #[error("MCP server is not running")]
    ServerNotRunning,

    /// Another install, update or provisioning holds the install lock.
    #[error("Another installation is in progress (lock held on {})", .lock.display())]
    InstallInProgress { lock: PathBuf },

    /// A tool subcommand exited non-zero; carries the classified failure.
    #[error("{0}")]
    ToolFailed(Box<StructuredError>),

    /// A pipeline stage exited non-zero.
    #[error("Stage '{stage}' failed: {}", .error.message)]
    StageFailed {
        stage: String,
        error: Box<StructuredError>,
    },

    /// Failed to parse the settings file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// A prompt needs an answer that cannot be obtained.
    #[error("Cannot prompt for '{key}' in non-interactive mode (no default value)")]
    PromptUnavailable { key: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for ifs-mcp operations.
pub type Result<T> = std::result::Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_not_found_lists_probes() {
        let err = McpError::EnvironmentNotFound {
            probes: vec!["uv --version".into(), "/opt/uv/uv --version".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("uv --version"));
        assert!(msg.contains("/opt/uv/uv --version"));
    }

    #[test]
    fn not_installed_displays_root() {
        let err = McpError::NotInstalled {
            root: PathBuf::from("/data/ifs_cloud_mcp_server/server"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/ifs_cloud_mcp_server/server"));
        assert!(msg.contains("ifs-mcp install"));
    }

    #[test]
    fn output_too_large_displays_limit() {
        let err = McpError::OutputTooLarge {
            command: "list".into(),
            limit: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("list"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn command_failed_displays_command_and_code() {
        let err = McpError::CommandFailed {
            command: "uv sync --extra cpu".into(),
            code: Some(2),
        };
        let msg = err.to_string();
        assert!(msg.contains("uv sync --extra cpu"));
        assert!(msg.contains('2'));
    }

    #[test]
    fn stage_failed_displays_stage() {
        let err = McpError::StageFailed {
            stage: "reindex-lexical".into(),
            error: Box::new(StructuredError::from_result(
                "reindex-lexical",
                &crate::shell::CommandResult::failure(Some(1), "", "index missing"),
            )),
        };
        let msg = err.to_string();
        assert!(msg.contains("reindex-lexical"));
        assert!(msg.contains("index missing"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: McpError = io_err.into();
        assert!(matches!(err, McpError::Io(_)));
    }

    #[test]
    fn anyhow_error_converts() {
        let err: McpError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "boom");
    }
}
