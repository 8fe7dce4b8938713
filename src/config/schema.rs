//! Settings schema.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source repository of the MCP server.
pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/graknol/ifs-cloud-core-mcp-server.git";

/// Archive of the default branch, used when git is unavailable.
pub const DEFAULT_ARCHIVE_URL: &str =
    "https://github.com/graknol/ifs-cloud-core-mcp-server/archive/refs/heads/main.zip";

/// Ten megabytes, the bound applied to buffered command output.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// User settings for ifs-mcp.
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Git origin of the server source.
    pub repository_url: String,

    /// Archive fallback for the server source.
    pub archive_url: String,

    /// Branch integrated by in-place updates.
    pub branch: String,

    /// Python version pinned when creating the managed venv.
    pub python_version: String,

    /// Module executed through `uv run python -m`.
    pub entry_module: String,

    /// Maximum combined stdout+stderr bytes of a buffered call.
    pub max_output_bytes: usize,

    /// Seconds between graceful and forced server termination.
    pub shutdown_grace_secs: u64,

    /// `--name` passed to the server subcommand.
    pub server_name: String,

    /// `--log-level` passed to the server subcommand.
    pub log_level: String,

    /// Overrides the platform install root.
    pub install_root: Option<PathBuf>,

    /// Overrides the platform application-data root.
    pub data_root: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            branch: "main".to_string(),
            python_version: "3.11".to_string(),
            entry_module: "src.ifs_cloud_mcp_server.main".to_string(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            shutdown_grace_secs: 2,
            server_name: "ifs-cloud-mcp-server".to_string(),
            log_level: "INFO".to_string(),
            install_root: None,
            data_root: None,
        }
    }
}

impl Settings {
    /// Grace period as a `Duration`.
    pub fn shutdown_grace(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.shutdown_grace_secs)
    }
}
