//! Library integration tests.

use std::fs;
use std::sync::Arc;

use ifs_mcp::bridge::CommandBridge;
use ifs_mcp::classify::ErrorKind;
use ifs_mcp::config::{AppPaths, Settings};
use ifs_mcp::sequencer::{CommandSequencer, FallbackOutcome, SetupMode};
use ifs_mcp::session::{ServerOptions, ServerSession};
use ifs_mcp::shell::MockRunner;
use ifs_mcp::status::{decide_toggle, RecordingSurface, StatusAggregator, ToggleAction};
use ifs_mcp::versions::Status;
use ifs_mcp::McpError;
use tempfile::TempDir;

fn bridge(temp: &TempDir, configure: impl FnOnce(&mut MockRunner)) -> (CommandBridge, Arc<MockRunner>) {
    let root = temp.path().join("server");
    fs::create_dir_all(&root).unwrap();
    let mut runner = MockRunner::new();
    runner.on_ok("uv --version", "uv 0.5.0");
    configure(&mut runner);
    let runner = Arc::new(runner);
    let bridge = CommandBridge::new(
        AppPaths::new(root, temp.path().join("data")),
        &Settings::default(),
        runner.clone(),
    );
    (bridge, runner)
}

#[test]
fn error_types_are_public() {
    let err = McpError::NotInstalled {
        root: "/opt/server".into(),
    };
    assert!(err.to_string().contains("/opt/server"));
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> ifs_mcp::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use ifs_mcp::cli::{Cli, Commands};

    let cli = Cli::parse_from(["ifs-mcp", "list", "--json"]);

    if let Some(Commands::List(args)) = cli.command {
        assert!(args.json);
    } else {
        panic!("Expected List command");
    }
}

#[test]
fn bridge_requires_an_install() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(MockRunner::new());
    let bridge = CommandBridge::new(
        AppPaths::new(temp.path().join("missing"), temp.path()),
        &Settings::default(),
        runner.clone(),
    );

    let err = bridge.run("list", &["--json"]).unwrap_err();

    assert!(matches!(err, McpError::NotInstalled { .. }));
    assert!(runner.calls().is_empty());
}

#[test]
fn fast_setup_falls_back_to_local_pipeline() {
    let temp = TempDir::new().unwrap();
    let (bridge, runner) = bridge(&temp, |r| {
        r.on_fail("download --version", 1, "No release found for 25.1.0");
        r.on_ok("analyze --version", "");
        r.on_ok("calculate-rank --version", "");
        r.on_ok("reindex-lexical --version", "");
    });

    let outcome = CommandSequencer::new(&bridge)
        .run_setup(SetupMode::Fast, "25.1.0", &mut ())
        .unwrap();

    match outcome {
        Some(FallbackOutcome::Local { remote_error }) => {
            assert_eq!(remote_error.kind, ErrorKind::ArtifactUnavailable)
        }
        other => panic!("Expected local fallback, got {:?}", other),
    }
    assert!(runner.was_called("reindex-lexical --version 25.1.0"));
    assert!(!runner.was_called("embed"));
}

#[test]
fn stage_failure_names_the_stage() {
    let temp = TempDir::new().unwrap();
    let (bridge, runner) = bridge(&temp, |r| {
        r.on_fail("analyze --version", 2, "Version directory not found");
    });

    let err = CommandSequencer::new(&bridge)
        .run_setup(SetupMode::Complete { embeddings: true }, "25.1.0", &mut ())
        .unwrap_err();

    match err {
        McpError::StageFailed { stage, error } => {
            assert_eq!(stage, "analyze");
            assert_eq!(error.kind, ErrorKind::VersionNotFound);
        }
        other => panic!("Expected StageFailed, got {:?}", other),
    }
    assert!(!runner.was_called("calculate-rank"));
}

#[test]
fn status_reflects_version_list() {
    let temp = TempDir::new().unwrap();
    let (bridge, _) = bridge(&temp, |r| {
        r.on_ok(
            "list --json",
            r#"[
                {"version": "25.1.0", "has_analysis": true, "has_pagerank": true, "has_bm25s": true, "has_faiss": true},
                {"version": "24.2.1", "has_analysis": true}
            ]"#,
        );
    });
    let mut session = ServerSession::new(bridge.clone(), ServerOptions::from_settings(&Settings::default()));
    let mut surface = RecordingSurface::new();

    let snapshot = StatusAggregator::new(&bridge, &mut surface).refresh(&mut session);

    assert_eq!(snapshot.status, Status::VersionsReady(1));
    assert_eq!(surface.last(), Some(Status::VersionsReady(1)));
    assert_eq!(
        decide_toggle(snapshot.status, &snapshot.versions),
        ToggleAction::StartServer {
            ready: vec!["25.1.0".to_string()]
        }
    );
}

#[test]
fn failed_listing_degrades_to_no_versions() {
    let temp = TempDir::new().unwrap();
    let (bridge, _) = bridge(&temp, |r| {
        r.on_fail("list --json", 1, "Traceback (most recent call last)");
    });
    let mut session = ServerSession::new(bridge.clone(), ServerOptions::from_settings(&Settings::default()));
    let mut surface = RecordingSurface::new();

    let snapshot = StatusAggregator::new(&bridge, &mut surface).refresh(&mut session);

    assert_eq!(snapshot.status, Status::NoVersions);
    assert!(snapshot.versions.is_empty());
}
