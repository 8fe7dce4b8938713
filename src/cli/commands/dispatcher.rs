//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`AppContext`] for the settings, paths and process runner every
//!   command shares
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::Path;
use std::sync::Arc;

use crate::bridge::CommandBridge;
use crate::cli::args::{Cli, Commands};
use crate::config::{load_settings, AppPaths, Settings};
use crate::error::Result;
use crate::install::InstallOrchestrator;
use crate::session::{ServerOptions, ServerSession};
use crate::shell::{ProcessRunner, SystemRunner};
use crate::ui::UserInterface;

use super::completions::CompletionsCommand;
use super::console::ConsoleCommand;
use super::install::InstallCommand;
use super::list::ListCommand;
use super::serve::ServeCommand;
use super::setup::SetupCommand;
use super::status::{ReportCommand, StatusCommand};
use super::toggle::ToggleCommand;
use super::tool::{DeleteCommand, DownloadCommand, ImportCommand, StageCommand};

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output and prompts
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Settings, resolved paths and the process runner shared by all commands.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub paths: AppPaths,
    pub runner: Arc<dyn ProcessRunner>,
}

impl AppContext {
    pub fn new(settings: Settings, paths: AppPaths, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            settings,
            paths,
            runner,
        }
    }

    /// Load settings (explicit file or platform default) and resolve paths.
    pub fn load(config: Option<&Path>) -> Result<Self> {
        let settings = load_settings(config)?;
        let paths = AppPaths::resolve(&settings);
        tracing::debug!(
            "Install root {}, data root {}",
            paths.install_root().display(),
            paths.data_root().display()
        );
        Ok(Self::new(settings, paths, Arc::new(SystemRunner)))
    }

    pub fn bridge(&self) -> CommandBridge {
        CommandBridge::new(self.paths.clone(), &self.settings, Arc::clone(&self.runner))
    }

    pub fn session(&self) -> ServerSession {
        ServerSession::new(self.bridge(), ServerOptions::from_settings(&self.settings))
    }

    pub fn orchestrator(&self) -> InstallOrchestrator {
        InstallOrchestrator::new(self.paths.clone(), &self.settings, Arc::clone(&self.runner))
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    context: AppContext,
}

impl CommandDispatcher {
    /// Create a new dispatcher over a loaded context.
    pub fn new(context: AppContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = self.context.clone();
        match &cli.command {
            Some(Commands::Install(args)) => InstallCommand::new(ctx, args.clone()).execute(ui),
            Some(Commands::Status) | None => StatusCommand::new(ctx).execute(ui),
            Some(Commands::Report) => ReportCommand::new(ctx).execute(ui),
            Some(Commands::Toggle) => ToggleCommand::new(ctx).execute(ui),
            Some(Commands::Console) => ConsoleCommand::new(ctx).execute(ui),
            Some(Commands::List(args)) => ListCommand::new(ctx, args.clone()).execute(ui),
            Some(Commands::Import(args)) => ImportCommand::new(ctx, args.clone()).execute(ui),
            Some(Commands::Delete(args)) => DeleteCommand::new(ctx, args.clone()).execute(ui),
            Some(Commands::Download(args)) => {
                DownloadCommand::new(ctx, args.version.clone()).execute(ui)
            }
            Some(Commands::Analyze(args)) => {
                StageCommand::analyze(ctx, args.version.clone()).execute(ui)
            }
            Some(Commands::CalculateRank(args)) => {
                StageCommand::calculate_rank(ctx, args.version.clone()).execute(ui)
            }
            Some(Commands::Embed(args)) => {
                StageCommand::embed(ctx, args.version.clone(), args.yes).execute(ui)
            }
            Some(Commands::ReindexLexical(args)) => {
                StageCommand::reindex_lexical(ctx, args.version.clone()).execute(ui)
            }
            Some(Commands::Setup(args)) => SetupCommand::new(ctx, args.clone()).execute(ui),
            Some(Commands::Serve(args)) => ServeCommand::new(ctx, args.version.clone()).execute(ui),
            Some(Commands::Completions(args)) => CompletionsCommand::new(args.clone()).execute(ui),
        }
    }
}
