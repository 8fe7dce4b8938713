//! Plain-text status report for informational panels and `ifs-mcp report`.

use std::fmt::Write;

use super::StatusSnapshot;
use crate::versions::VersionRecord;

fn mark(present: bool) -> &'static str {
    if present {
        "✓"
    } else {
        "✗"
    }
}

fn render_version(out: &mut String, v: &VersionRecord, disagrees: bool) {
    let state = if v.is_ready_derived() {
        "ready"
    } else {
        "needs setup"
    };
    let created = v
        .created_at
        .map(|c| c.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let _ = writeln!(out, "  {}  [{}]", v.id, state);
    let _ = writeln!(
        out,
        "    analysis {}  lexical {}  vector {}  rank {}",
        mark(v.flags.has_analysis),
        mark(v.flags.has_lexical_index),
        mark(v.flags.has_vector_index),
        mark(v.flags.has_rank)
    );
    let _ = writeln!(out, "    files: {}  created: {}", v.file_count, created);
    if disagrees {
        let _ = writeln!(
            out,
            "    note: tool reports {}, artifacts disagree",
            if v.is_ready { "ready" } else { "not ready" }
        );
    }
}

/// Render a snapshot as a text block.
pub fn render_report(snapshot: &StatusSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "IFS Cloud MCP Server");
    let _ = writeln!(
        out,
        "Status: {} ({})",
        snapshot.status.label(),
        snapshot.status.description()
    );
    match &snapshot.server {
        Some(server) => {
            let _ = writeln!(
                out,
                "Server: running version {} (pid {})",
                server.version, server.pid
            );
        }
        None => {
            let _ = writeln!(out, "Server: stopped");
        }
    }

    if !snapshot.versions.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Versions:");
        for v in &snapshot.versions {
            let disagrees = snapshot.disagreements.iter().any(|id| id == &v.id);
            render_version(&mut out, v, disagrees);
        }
    }

    if !snapshot.disk_versions.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Index data on disk: {}",
            snapshot.disk_versions.join(", ")
        );
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ServerInfo;
    use crate::versions::{parse_timestamp, Status, VersionFlags};

    fn snapshot() -> StatusSnapshot {
        StatusSnapshot {
            status: Status::VersionsReady(1),
            versions: vec![
                VersionRecord {
                    id: "25.1.0".into(),
                    flags: VersionFlags {
                        has_analysis: true,
                        has_lexical_index: true,
                        has_vector_index: true,
                        has_rank: true,
                        ..Default::default()
                    },
                    is_ready: true,
                    file_count: 12345,
                    created_at: parse_timestamp("2025-03-01T10:20:30"),
                    ..Default::default()
                },
                VersionRecord {
                    id: "24.2.1".into(),
                    flags: VersionFlags {
                        has_analysis: true,
                        has_lexical_index: true,
                        has_rank: true,
                        ..Default::default()
                    },
                    is_ready: true,
                    ..Default::default()
                },
            ],
            disk_versions: vec!["25.1.0".into()],
            disagreements: vec!["24.2.1".into()],
            server: None,
        }
    }

    #[test]
    fn report_lists_versions_and_disagreements() {
        insta::assert_snapshot!(render_report(&snapshot()), @r"
        IFS Cloud MCP Server
        Status: 1 ready (1 version(s) ready to serve)
        Server: stopped

        Versions:
          25.1.0  [ready]
            analysis ✓  lexical ✓  vector ✓  rank ✓
            files: 12345  created: 2025-03-01 10:20
          24.2.1  [needs setup]
            analysis ✓  lexical ✓  vector ✗  rank ✓
            files: 0  created: unknown
            note: tool reports ready, artifacts disagree

        Index data on disk: 25.1.0
        ");
    }

    #[test]
    fn report_shows_running_server() {
        let snapshot = StatusSnapshot {
            status: Status::ServerRunning,
            server: Some(ServerInfo {
                pid: 4242,
                version: "25.1.0".into(),
            }),
            versions: Vec::new(),
            disk_versions: Vec::new(),
            disagreements: Vec::new(),
        };
        insta::assert_snapshot!(render_report(&snapshot), @r"
        IFS Cloud MCP Server
        Status: Running (MCP server is running)
        Server: running version 25.1.0 (pid 4242)
        ");
    }
}
