//! Individual tool commands: `import`, `delete`, `download`, and the
//! single-stage commands `analyze`, `calculate-rank`, `embed` and
//! `reindex-lexical`.

use crate::bridge::CommandBridge;
use crate::classify::StructuredError;
use crate::cli::args::{DeleteArgs, ImportArgs};
use crate::error::Result;
use crate::sequencer::{local_pipeline_stages, CommandSequencer, Stage};
use crate::ui::{confirm, show_structured_error, UserInterface};

use super::display::UiObserver;
use super::dispatcher::{AppContext, Command, CommandResult};
use super::pickers::{pick_version, VersionFilter};

/// Run one tool subcommand behind a spinner.
///
/// A non-zero exit comes back classified and already shown.
fn run_tool(
    ui: &mut dyn UserInterface,
    bridge: &CommandBridge,
    command: &str,
    args: &[&str],
    progress: &str,
) -> Result<std::result::Result<(), StructuredError>> {
    let mut spinner = ui.start_spinner(progress);
    let result = match bridge.run(command, args) {
        Ok(result) => result,
        Err(e) => {
            spinner.finish_error(&format!("{} failed", command));
            return Err(e);
        }
    };

    if result.success {
        spinner.finish_success(&format!("{} complete", command));
        if ui.output_mode().shows_command_output() && !result.stdout.trim().is_empty() {
            ui.message(result.stdout.trim_end());
        }
        Ok(Ok(()))
    } else {
        spinner.finish_error(&format!("{} failed", command));
        let error = StructuredError::from_result(command, &result);
        show_structured_error(ui, &error);
        Ok(Err(error))
    }
}

/// The `import` command.
pub struct ImportCommand {
    ctx: AppContext,
    args: ImportArgs,
}

impl ImportCommand {
    pub fn new(ctx: AppContext, args: ImportArgs) -> Self {
        Self { ctx, args }
    }
}

impl Command for ImportCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let archive = &self.args.archive;
        if !archive.is_file() {
            ui.error(&format!("Archive not found: {}", archive.display()));
            return Ok(CommandResult::failure(2));
        }
        let is_zip = archive
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if !is_zip {
            ui.warning(&format!(
                "{} does not have a .zip extension; importing anyway",
                archive.display()
            ));
        }

        // The tool runs inside the install root, so relative paths would
        // resolve against the wrong directory.
        let absolute = std::path::absolute(archive)?;
        let path = absolute.to_string_lossy();
        let bridge = self.ctx.bridge();

        let progress = format!("Importing {}", archive.display());
        match run_tool(ui, &bridge, "import", &[&path], &progress)? {
            Ok(()) => {
                ui.success("Import complete");
                ui.message("Next: run 'ifs-mcp setup' to prepare the version for serving.");
                Ok(CommandResult::success())
            }
            Err(_) => Ok(CommandResult::failure(1)),
        }
    }
}

/// The `delete` command.
pub struct DeleteCommand {
    ctx: AppContext,
    args: DeleteArgs,
}

impl DeleteCommand {
    pub fn new(ctx: AppContext, args: DeleteArgs) -> Self {
        Self { ctx, args }
    }
}

impl Command for DeleteCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let bridge = self.ctx.bridge();
        let Some(version) = pick_version(
            ui,
            &bridge,
            self.args.version.as_deref(),
            VersionFilter::Any,
            "Which version do you want to delete?",
        )?
        else {
            return Ok(CommandResult::failure(1));
        };

        if !self.args.yes {
            let question = format!(
                "Delete version {} and all of its indexes? This cannot be undone.",
                version
            );
            if !confirm(ui, "delete_version", &question, false)? {
                ui.message("Nothing deleted.");
                return Ok(CommandResult::success());
            }
        }

        let progress = format!("Deleting {}", version);
        match run_tool(ui, &bridge, "delete", &["--version", &version, "--force"], &progress)? {
            Ok(()) => {
                ui.success(&format!("Deleted version {}", version));
                Ok(CommandResult::success())
            }
            Err(_) => Ok(CommandResult::failure(1)),
        }
    }
}

/// The `download` command.
///
/// When no pre-built indexes are published, or the download fails on the
/// network, offers to compute them with the local pipeline.
pub struct DownloadCommand {
    ctx: AppContext,
    version: Option<String>,
}

impl DownloadCommand {
    pub fn new(ctx: AppContext, version: Option<String>) -> Self {
        Self { ctx, version }
    }
}

impl Command for DownloadCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let bridge = self.ctx.bridge();
        let Some(version) = pick_version(
            ui,
            &bridge,
            self.version.as_deref(),
            VersionFilter::Any,
            "Which version do you want to download indexes for?",
        )?
        else {
            return Ok(CommandResult::failure(1));
        };

        let progress = format!("Downloading pre-built indexes for {}", version);
        let error = match run_tool(
            ui,
            &bridge,
            "download",
            &["--version", &version, "--force"],
            &progress,
        )? {
            Ok(()) => {
                ui.success(&format!("Indexes for {} downloaded", version));
                return Ok(CommandResult::success());
            }
            Err(error) => error,
        };

        if !error.kind.offers_local_generation() {
            return Ok(CommandResult::failure(1));
        }
        let generate = confirm(
            ui,
            "generate_locally",
            "Generate the indexes locally instead? This can take a while.",
            true,
        )?;
        if !generate {
            return Ok(CommandResult::failure(1));
        }

        tracing::info!("Generating indexes for {} locally after failed download", version);
        CommandSequencer::new(&bridge)
            .run_pipeline(&local_pipeline_stages(&version), &mut UiObserver::new(ui))?;
        ui.success(&format!("Indexes for {} generated locally", version));
        Ok(CommandResult::success())
    }
}

/// A command that runs one pipeline stage for one version.
pub struct StageCommand {
    ctx: AppContext,
    command: &'static str,
    filter: VersionFilter,
    version: Option<String>,
    resource_warning: bool,
}

impl StageCommand {
    fn new(ctx: AppContext, command: &'static str, filter: VersionFilter, version: Option<String>) -> Self {
        Self {
            ctx,
            command,
            filter,
            version,
            resource_warning: false,
        }
    }

    pub fn analyze(ctx: AppContext, version: Option<String>) -> Self {
        Self::new(ctx, "analyze", VersionFilter::Any, version)
    }

    pub fn calculate_rank(ctx: AppContext, version: Option<String>) -> Self {
        Self::new(ctx, "calculate-rank", VersionFilter::Analyzed, version)
    }

    /// `skip_warning` suppresses the resource usage confirmation.
    pub fn embed(ctx: AppContext, version: Option<String>, skip_warning: bool) -> Self {
        Self {
            resource_warning: !skip_warning,
            ..Self::new(ctx, "embed", VersionFilter::Analyzed, version)
        }
    }

    pub fn reindex_lexical(ctx: AppContext, version: Option<String>) -> Self {
        Self::new(ctx, "reindex-lexical", VersionFilter::Analyzed, version)
    }
}

impl Command for StageCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let bridge = self.ctx.bridge();
        let question = format!("Which version should '{}' run on?", self.command);
        let Some(version) =
            pick_version(ui, &bridge, self.version.as_deref(), self.filter, &question)?
        else {
            return Ok(CommandResult::failure(1));
        };

        if self.resource_warning {
            ui.warning(
                "Embedding is resource intensive: it uses the GPU when available, \
                 a lot of memory, and can take hours on large versions.",
            );
            if !confirm(ui, "embed_resources", "Continue with embedding?", false)? {
                ui.message("Embedding skipped.");
                return Ok(CommandResult::success());
            }
        }

        let stage = Stage::new(self.command, ["--version", version.as_str()]);
        CommandSequencer::new(&bridge).run_pipeline(&[stage], &mut UiObserver::new(ui))?;
        Ok(CommandResult::success())
    }
}
