//! Publishing one status to the outside world.
//!
//! [`StatusAggregator::refresh`] gathers install state, the install lock,
//! server liveness and the version list, reduces them with
//! [`derive_status`], and hands the result to a [`StatusSurface`].

pub mod report;
pub mod toggle;

use std::path::Path;

use crate::bridge::CommandBridge;
use crate::error::McpError;
use crate::install::InstallLock;
use crate::session::ServerSession;
use crate::versions::{
    derive_status, discover_index_versions, readiness_disagreements, Status, VersionRecord,
};

pub use report::render_report;
pub use toggle::{decide_toggle, ToggleAction};

/// Where status updates are displayed.
pub trait StatusSurface {
    /// Show a new status. `detail` is a longer human description.
    fn publish(&mut self, status: Status, detail: &str);
}

/// A surface that remembers everything it was shown.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    published: Vec<(Status, String)>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> &[(Status, String)] {
        &self.published
    }

    pub fn last(&self) -> Option<Status> {
        self.published.last().map(|(s, _)| *s)
    }
}

impl StatusSurface for RecordingSurface {
    fn publish(&mut self, status: Status, detail: &str) {
        self.published.push((status, detail.to_string()));
    }
}

/// The running server as seen at refresh time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub pid: u32,
    pub version: String,
}

/// Everything a refresh found.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub status: Status,
    pub versions: Vec<VersionRecord>,
    /// Version ids with index data on disk.
    pub disk_versions: Vec<String>,
    /// Ids whose reported readiness disagrees with their artifacts.
    pub disagreements: Vec<String>,
    pub server: Option<ServerInfo>,
}

impl StatusSnapshot {
    fn bare(status: Status) -> Self {
        Self {
            status,
            versions: Vec::new(),
            disk_versions: Vec::new(),
            disagreements: Vec::new(),
            server: None,
        }
    }
}

/// Computes and publishes the status.
pub struct StatusAggregator<'a> {
    bridge: &'a CommandBridge,
    surface: &'a mut dyn StatusSurface,
}

impl<'a> StatusAggregator<'a> {
    pub fn new(bridge: &'a CommandBridge, surface: &'a mut dyn StatusSurface) -> Self {
        Self { bridge, surface }
    }

    /// Recompute the status from scratch and publish it.
    pub fn refresh(&mut self, session: &mut ServerSession) -> StatusSnapshot {
        let snapshot = self.snapshot(session);
        self.surface
            .publish(snapshot.status, &snapshot.status.description());
        snapshot
    }

    fn snapshot(&self, session: &mut ServerSession) -> StatusSnapshot {
        let paths = self.bridge.paths();

        // A live server owned by this session outranks the lock and the root.
        let server = session.running().map(|s| ServerInfo {
            pid: s.pid(),
            version: s.version().to_string(),
        });
        let busy = InstallLock::is_held(&paths.lock_path());
        if busy || !paths.is_installed() {
            let status = match (&server, busy) {
                (Some(_), _) => Status::ServerRunning,
                (None, true) => Status::InstallInProgress,
                (None, false) => Status::NotInstalled,
            };
            return StatusSnapshot {
                server,
                ..StatusSnapshot::bare(status)
            };
        }

        let versions = match self.bridge.list_versions() {
            Ok(versions) => versions,
            Err(McpError::NotInstalled { .. }) if server.is_none() => {
                return StatusSnapshot::bare(Status::NotInstalled)
            }
            Err(e) => {
                tracing::warn!("Could not list versions: {}", e);
                Vec::new()
            }
        };

        let disagreements = readiness_disagreements(&versions)
            .into_iter()
            .map(|v| v.id.clone())
            .collect();
        let disk_versions = disk_versions(&paths.indexes_dir());
        let status = derive_status(&versions, server.is_some());

        StatusSnapshot {
            status,
            versions,
            disk_versions,
            disagreements,
            server,
        }
    }
}

fn disk_versions(indexes_dir: &Path) -> Vec<String> {
    discover_index_versions(indexes_dir).unwrap_or_else(|e| {
        tracing::warn!("Could not scan {}: {}", indexes_dir.display(), e);
        Vec::new()
    })
}
