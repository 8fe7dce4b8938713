//! Turning failures into something a user can act on.
//!
//! Every failure path ends as a [`StructuredError`]: a kind, the message,
//! the command that produced it and an ordered list of suggestions. Tool
//! output is classified textually against the table in [`patterns`];
//! crate errors are classified structurally by variant.

pub mod patterns;

use std::fmt;

use crate::error::McpError;
use crate::shell::CommandResult;

pub use patterns::{built_in_patterns, matching_patterns, ErrorPattern, PatternContext};

/// Fallback message when a failed command printed nothing.
pub const GENERIC_FAILURE: &str = "Command failed";

/// What went wrong, coarsely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EnvironmentNotFound,
    NotInstalled,
    OutputTooLarge,
    ProcessSpawnFailed,
    /// Non-zero exit with no more specific classification.
    CommandFailed(Option<i32>),
    NetworkFailure,
    VersionNotFound,
    NotAnalyzed,
    DependencyInstallFailed,
    /// No pre-built artifact exists remotely for the requested version.
    ArtifactUnavailable,
    InstallInProgress,
    ServerState,
    Internal,
}

impl ErrorKind {
    /// Whether running the local pipeline is a sensible response.
    pub fn offers_local_generation(self) -> bool {
        matches!(self, ErrorKind::ArtifactUnavailable | ErrorKind::NetworkFailure)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::EnvironmentNotFound => write!(f, "environment not found"),
            ErrorKind::NotInstalled => write!(f, "not installed"),
            ErrorKind::OutputTooLarge => write!(f, "output too large"),
            ErrorKind::ProcessSpawnFailed => write!(f, "process spawn failed"),
            ErrorKind::CommandFailed(Some(code)) => write!(f, "command failed (exit {})", code),
            ErrorKind::CommandFailed(None) => write!(f, "command failed"),
            ErrorKind::NetworkFailure => write!(f, "network failure"),
            ErrorKind::VersionNotFound => write!(f, "version not found"),
            ErrorKind::NotAnalyzed => write!(f, "not analyzed"),
            ErrorKind::DependencyInstallFailed => write!(f, "dependency install failed"),
            ErrorKind::ArtifactUnavailable => write!(f, "artifact unavailable"),
            ErrorKind::InstallInProgress => write!(f, "install in progress"),
            ErrorKind::ServerState => write!(f, "server state"),
            ErrorKind::Internal => write!(f, "internal error"),
        }
    }
}

/// A classified failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredError {
    pub kind: ErrorKind,
    pub message: String,
    pub command: String,
    pub suggestions: Vec<String>,
}

impl StructuredError {
    /// Classify a failed buffered call of a tool subcommand.
    ///
    /// The message is stderr, else stdout, else [`GENERIC_FAILURE`]. The
    /// longest matching pattern decides the kind; suggestions from every
    /// matching pattern are kept, longest match first, without duplicates.
    pub fn from_result(command: &str, result: &CommandResult) -> Self {
        let message = failure_message(result);
        let matches = matching_patterns(&message, command);

        let kind = matches
            .iter()
            .find_map(|m| m.pattern.kind)
            .unwrap_or(ErrorKind::CommandFailed(result.exit_code));

        let mut suggestions: Vec<String> = Vec::new();
        for m in &matches {
            for s in m.pattern.suggestions {
                if !suggestions.iter().any(|existing| existing == s) {
                    suggestions.push((*s).to_string());
                }
            }
        }

        if let Some(first) = matches.first() {
            tracing::debug!("Classified '{}' failure as {} ({})", command, kind, first.pattern.name);
        }

        Self {
            kind,
            message,
            command: command.to_string(),
            suggestions,
        }
    }

    /// Classify a crate error raised while running `command`.
    ///
    /// Errors that already carry a classification are returned as is.
    pub fn from_error(command: &str, error: &McpError) -> Self {
        let (kind, suggestions): (ErrorKind, &[&str]) = match error {
            McpError::EnvironmentNotFound { .. } => (
                ErrorKind::EnvironmentNotFound,
                &["Install uv globally, or run 'ifs-mcp install' to download a portable copy"],
            ),
            McpError::NotInstalled { .. } => (
                ErrorKind::NotInstalled,
                &["Run 'ifs-mcp install' to install the MCP server"],
            ),
            McpError::OutputTooLarge { .. } => (
                ErrorKind::OutputTooLarge,
                &["Raise 'max_output_bytes' in the settings file"],
            ),
            McpError::ProcessSpawnFailed { .. } => (
                ErrorKind::ProcessSpawnFailed,
                &["Check that the program exists and is executable"],
            ),
            McpError::CommandFailed { code, .. } => (ErrorKind::CommandFailed(*code), &[]),
            McpError::NetworkFailure { .. } => (
                ErrorKind::NetworkFailure,
                &["Check your internet connection and retry"],
            ),
            McpError::VersionNotFound { .. } => (
                ErrorKind::VersionNotFound,
                &["Run 'ifs-mcp list' to see available versions"],
            ),
            McpError::NotAnalyzed { .. } => (
                ErrorKind::NotAnalyzed,
                &["Run 'ifs-mcp analyze' for this version first"],
            ),
            McpError::DependencyInstallFailed { .. } => (
                ErrorKind::DependencyInstallFailed,
                &[
                    "Retry with the CPU build",
                    "Reinstall with 'ifs-mcp install'",
                ],
            ),
            McpError::InstallInProgress { .. } => (
                ErrorKind::InstallInProgress,
                &["Wait for the other installation to finish"],
            ),
            McpError::ServerAlreadyRunning { .. } => (
                ErrorKind::ServerState,
                &["Stop the running server first ('ifs-mcp toggle')"],
            ),
            McpError::ServerNotRunning => (ErrorKind::ServerState, &[]),
            McpError::ToolFailed(inner) | McpError::StageFailed { error: inner, .. } => {
                return (**inner).clone();
            }
            McpError::ConfigParseError { .. }
            | McpError::PromptUnavailable { .. }
            | McpError::Io(_)
            | McpError::Other(_) => (ErrorKind::Internal, &[]),
        };

        Self {
            kind,
            message: error.to_string(),
            command: command.to_string(),
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.command, self.message)
    }
}

impl std::error::Error for StructuredError {}

fn failure_message(result: &CommandResult) -> String {
    let stderr = result.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = result.stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    GENERIC_FAILURE.to_string()
}
