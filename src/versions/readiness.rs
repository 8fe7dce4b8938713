//! Reducing version records and server liveness to one status.

use std::fmt;

use super::record::VersionRecord;

/// User-facing status of the toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotInstalled,
    InstallInProgress,
    NoVersions,
    /// No version is ready; carries the total number of versions.
    VersionsNeedSetup(usize),
    /// Carries the number of ready versions.
    VersionsReady(usize),
    ServerRunning,
}

impl Status {
    /// Short label for a status bar.
    pub fn label(&self) -> String {
        match self {
            Status::NotInstalled => "Install".to_string(),
            Status::InstallInProgress => "Installing".to_string(),
            Status::NoVersions => "No data".to_string(),
            Status::VersionsNeedSetup(n) => format!("{} needs setup", n),
            Status::VersionsReady(n) => format!("{} ready", n),
            Status::ServerRunning => "Running".to_string(),
        }
    }

    /// Longer explanation for tooltips and `status` output.
    pub fn description(&self) -> String {
        match self {
            Status::NotInstalled => "MCP server is not installed".to_string(),
            Status::InstallInProgress => "An installation is in progress".to_string(),
            Status::NoVersions => "No IFS Cloud versions imported".to_string(),
            Status::VersionsNeedSetup(n) => {
                format!("{} version(s) imported, none ready to serve", n)
            }
            Status::VersionsReady(n) => format!("{} version(s) ready to serve", n),
            Status::ServerRunning => "MCP server is running".to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Derive the status from version records and server liveness.
///
/// A live server dominates. Readiness is the flag conjunction; the tool's
/// own `is_ready` is ignored here.
///
/// # Example
///
/// ```
/// use ifs_mcp::versions::{derive_status, Status};
///
/// assert_eq!(derive_status(&[], true), Status::ServerRunning);
/// assert_eq!(derive_status(&[], false), Status::NoVersions);
/// ```
pub fn derive_status(versions: &[VersionRecord], server_alive: bool) -> Status {
    if server_alive {
        return Status::ServerRunning;
    }
    if versions.is_empty() {
        return Status::NoVersions;
    }
    let ready = versions.iter().filter(|v| v.is_ready_derived()).count();
    if ready > 0 {
        Status::VersionsReady(ready)
    } else {
        Status::VersionsNeedSetup(versions.len())
    }
}

/// Versions whose reported `is_ready` disagrees with the flag conjunction.
///
/// Each one is logged at warn level.
pub fn readiness_disagreements(versions: &[VersionRecord]) -> Vec<&VersionRecord> {
    versions
        .iter()
        .filter(|v| v.readiness_disagrees())
        .inspect(|v| {
            tracing::warn!(
                "Version {} reports is_ready={} but artifacts say {} (rank={}, lexical={}, vector={})",
                v.id,
                v.is_ready,
                v.is_ready_derived(),
                v.flags.has_rank,
                v.flags.has_lexical_index,
                v.flags.has_vector_index
            )
        })
        .collect()
}

/// Versions usable by the server, in input order.
pub fn ready_versions(versions: &[VersionRecord]) -> Vec<&VersionRecord> {
    versions.iter().filter(|v| v.is_ready_derived()).collect()
}
