//! Ordered tool pipelines with abort-on-failure and remote-first fallback.
//!
//! Stages run strictly in order. The first non-zero exit stops the
//! pipeline and is reported as [`McpError::StageFailed`] with the stage's
//! classified error. Nothing is rolled back: artifacts of earlier stages
//! stay where they are.

pub mod workflows;

use crate::bridge::CommandBridge;
use crate::classify::StructuredError;
use crate::error::{McpError, Result};
use crate::shell::CommandResult;

pub use workflows::{complete_setup_stages, fast_setup_remote, local_pipeline_stages, SetupMode};

/// Something that runs a tool subcommand and returns its buffered result.
pub trait CommandExecutor {
    fn execute(&self, command: &str, args: &[&str]) -> Result<CommandResult>;
}

impl CommandExecutor for CommandBridge {
    fn execute(&self, command: &str, args: &[&str]) -> Result<CommandResult> {
        self.run(command, args)
    }
}

/// One pipeline stage: a tool subcommand and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub command: String,
    pub args: Vec<String>,
}

impl Stage {
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Stage name used in reports.
    pub fn name(&self) -> &str {
        &self.command
    }

    fn arg_refs(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }
}

/// Receives progress notifications. All methods default to no-ops.
pub trait StageObserver {
    fn stage_started(&mut self, _index: usize, _total: usize, _stage: &Stage) {}
    fn stage_succeeded(&mut self, _stage: &Stage, _result: &CommandResult) {}
    fn stage_failed(&mut self, _stage: &Stage, _error: &StructuredError) {}
    fn falling_back(&mut self, _remote_error: &StructuredError) {}
}

impl StageObserver for () {}

/// How a remote-first operation completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    /// The remote action succeeded; no local stage ran.
    Remote,
    /// The remote action failed and the local pipeline succeeded.
    Local { remote_error: StructuredError },
}

/// Runs stage lists against an executor.
pub struct CommandSequencer<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> CommandSequencer<'a> {
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }

    /// Run a single stage, classifying a non-zero exit.
    fn run_stage(&self, stage: &Stage) -> Result<std::result::Result<CommandResult, StructuredError>> {
        let result = self.executor.execute(&stage.command, &stage.arg_refs())?;
        if result.success {
            Ok(Ok(result))
        } else {
            Ok(Err(StructuredError::from_result(&stage.command, &result)))
        }
    }

    /// Execute stages in order, stopping at the first failure.
    pub fn run_pipeline(&self, stages: &[Stage], observer: &mut dyn StageObserver) -> Result<()> {
        let total = stages.len();
        for (index, stage) in stages.iter().enumerate() {
            observer.stage_started(index, total, stage);
            tracing::debug!("Stage {}/{}: {}", index + 1, total, stage.name());

            let outcome = match self.run_stage(stage) {
                Ok(outcome) => outcome,
                Err(e) => Err(StructuredError::from_error(&stage.command, &e)),
            };

            match outcome {
                Ok(result) => observer.stage_succeeded(stage, &result),
                Err(error) => {
                    tracing::info!(
                        "Pipeline aborted at stage '{}' ({} remaining)",
                        stage.name(),
                        total - index - 1
                    );
                    observer.stage_failed(stage, &error);
                    return Err(McpError::StageFailed {
                        stage: stage.name().to_string(),
                        error: Box::new(error),
                    });
                }
            }
        }
        Ok(())
    }

    /// Try `remote`; on a non-zero exit run `local` instead.
    ///
    /// Errors that prevent `remote` from running at all (tool not installed,
    /// no package manager) are returned without trying `local`, since it
    /// would fail the same way.
    pub fn run_with_remote_fallback(
        &self,
        remote: &Stage,
        local: &[Stage],
        observer: &mut dyn StageObserver,
    ) -> Result<FallbackOutcome> {
        observer.stage_started(0, 1, remote);
        match self.run_stage(remote)? {
            Ok(result) => {
                observer.stage_succeeded(remote, &result);
                Ok(FallbackOutcome::Remote)
            }
            Err(remote_error) => {
                tracing::info!(
                    "'{}' failed ({}), running local pipeline",
                    remote.name(),
                    remote_error.kind
                );
                observer.falling_back(&remote_error);
                self.run_pipeline(local, observer)?;
                Ok(FallbackOutcome::Local { remote_error })
            }
        }
    }
}

impl CommandSequencer<'_> {
    /// Run a setup workflow for one version.
    ///
    /// Fast setup returns the fallback outcome; complete setup returns
    /// `None`.
    pub fn run_setup(
        &self,
        mode: SetupMode,
        version: &str,
        observer: &mut dyn StageObserver,
    ) -> Result<Option<FallbackOutcome>> {
        match mode {
            SetupMode::Fast => self
                .run_with_remote_fallback(
                    &fast_setup_remote(version),
                    &local_pipeline_stages(version),
                    observer,
                )
                .map(Some),
            SetupMode::Complete { embeddings } => {
                self.run_pipeline(&complete_setup_stages(version, embeddings), observer)?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Executor that fails the listed commands and records every call.
    struct Scripted {
        failing: Vec<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(failing: &[&'static str]) -> Self {
            Self {
                failing: failing.to_vec(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn count(&self, command: &str) -> usize {
            self.calls.borrow().iter().filter(|c| *c == command).count()
        }
    }

    impl CommandExecutor for Scripted {
        fn execute(&self, command: &str, _args: &[&str]) -> Result<CommandResult> {
            self.calls.borrow_mut().push(command.to_string());
            if self.failing.contains(&command) {
                Ok(CommandResult::failure(Some(1), "", format!("{} broke", command)))
            } else {
                Ok(CommandResult::success("ok", ""))
            }
        }
    }

    fn stages(names: &[&str]) -> Vec<Stage> {
        names
            .iter()
            .map(|n| Stage::new(*n, ["--version", "25.1.0"]))
            .collect()
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl StageObserver for Recorder {
        fn stage_started(&mut self, index: usize, total: usize, stage: &Stage) {
            self.events.push(format!("start {} {}/{}", stage.name(), index + 1, total));
        }
        fn stage_failed(&mut self, stage: &Stage, _error: &StructuredError) {
            self.events.push(format!("fail {}", stage.name()));
        }
        fn falling_back(&mut self, _remote_error: &StructuredError) {
            self.events.push("fallback".to_string());
        }
    }

    #[test]
    fn pipeline_runs_all_stages_in_order() {
        let exec = Scripted::new(&[]);
        CommandSequencer::new(&exec)
            .run_pipeline(&stages(&["a", "b", "c"]), &mut ())
            .unwrap();
        assert_eq!(*exec.calls.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn pipeline_aborts_at_first_failure() {
        let exec = Scripted::new(&["b"]);
        let mut recorder = Recorder::default();
        let err = CommandSequencer::new(&exec)
            .run_pipeline(&stages(&["a", "b", "c"]), &mut recorder)
            .unwrap_err();

        match err {
            McpError::StageFailed { stage, error } => {
                assert_eq!(stage, "b");
                assert_eq!(error.message, "b broke");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(exec.count("c"), 0);
        assert_eq!(recorder.events.last().unwrap(), "fail b");
    }

    #[test]
    fn remote_success_skips_local() {
        let exec = Scripted::new(&[]);
        let outcome = CommandSequencer::new(&exec)
            .run_with_remote_fallback(
                &Stage::new("download", ["--version", "25.1.0", "--force"]),
                &stages(&["analyze", "calculate-rank"]),
                &mut (),
            )
            .unwrap();
        assert_eq!(outcome, FallbackOutcome::Remote);
        assert_eq!(exec.count("analyze"), 0);
        assert_eq!(exec.count("calculate-rank"), 0);
    }

    #[test]
    fn remote_failure_runs_local() {
        let exec = Scripted::new(&["download"]);
        let mut recorder = Recorder::default();
        let outcome = CommandSequencer::new(&exec)
            .run_with_remote_fallback(
                &Stage::new("download", ["--version", "25.1.0"]),
                &stages(&["analyze", "calculate-rank"]),
                &mut recorder,
            )
            .unwrap();

        match outcome {
            FallbackOutcome::Local { remote_error } => {
                assert_eq!(remote_error.command, "download")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(*exec.calls.borrow(), vec!["download", "analyze", "calculate-rank"]);
        assert!(recorder.events.contains(&"fallback".to_string()));
    }

    #[test]
    fn local_failure_after_fallback_names_stage() {
        let exec = Scripted::new(&["download", "calculate-rank"]);
        let err = CommandSequencer::new(&exec)
            .run_with_remote_fallback(
                &Stage::new("download", ["--version", "25.1.0"]),
                &stages(&["analyze", "calculate-rank", "reindex-lexical"]),
                &mut (),
            )
            .unwrap_err();
        assert!(matches!(err, McpError::StageFailed { ref stage, .. } if stage == "calculate-rank"));
        assert_eq!(exec.count("reindex-lexical"), 0);
    }

    #[test]
    fn complete_setup_with_embeddings_runs_embed_last() {
        let exec = Scripted::new(&[]);
        let outcome = CommandSequencer::new(&exec)
            .run_setup(SetupMode::Complete { embeddings: true }, "25.1.0", &mut ())
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(
            *exec.calls.borrow(),
            vec!["analyze", "calculate-rank", "reindex-lexical", "embed"]
        );
    }

    #[test]
    fn fast_setup_uses_download_first() {
        let exec = Scripted::new(&[]);
        let outcome = CommandSequencer::new(&exec)
            .run_setup(SetupMode::Fast, "25.1.0", &mut ())
            .unwrap();
        assert_eq!(outcome, Some(FallbackOutcome::Remote));
        assert_eq!(*exec.calls.borrow(), vec!["download"]);
    }

    #[test]
    fn executor_error_becomes_stage_failure() {
        struct Broken;
        impl CommandExecutor for Broken {
            fn execute(&self, command: &str, _args: &[&str]) -> Result<CommandResult> {
                Err(McpError::OutputTooLarge {
                    command: command.to_string(),
                    limit: 8,
                })
            }
        }

        let err = CommandSequencer::new(&Broken)
            .run_pipeline(&stages(&["analyze"]), &mut ())
            .unwrap_err();
        match err {
            McpError::StageFailed { error, .. } => {
                assert_eq!(error.kind, crate::classify::ErrorKind::OutputTooLarge)
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
