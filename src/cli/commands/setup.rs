//! Setup command implementation.
//!
//! `ifs-mcp setup` prepares one version for serving, either by downloading
//! pre-built indexes (fast) or by computing them locally (complete).

use crate::cli::args::{SetupArgs, SetupKind};
use crate::error::Result;
use crate::sequencer::{CommandSequencer, FallbackOutcome, SetupMode};
use crate::ui::{choose, confirm, PromptOption, UserInterface};
use crate::versions::VersionRecord;

use super::display::UiObserver;
use super::dispatcher::{AppContext, Command, CommandResult};
use super::pickers::{pick_from, pick_version, VersionFilter};

/// The setup command implementation.
pub struct SetupCommand {
    ctx: AppContext,
    args: SetupArgs,
}

impl SetupCommand {
    pub fn new(ctx: AppContext, args: SetupArgs) -> Self {
        Self { ctx, args }
    }

    fn mode(&self) -> SetupMode {
        match self.args.mode {
            SetupKind::Fast => SetupMode::Fast,
            SetupKind::Complete => SetupMode::Complete {
                embeddings: self.args.embeddings,
            },
        }
    }
}

impl Command for SetupCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if self.args.embeddings && self.args.mode == SetupKind::Fast {
            ui.warning("--embeddings only applies to complete setup; ignoring it");
        }

        let bridge = self.ctx.bridge();
        let Some(version) = pick_version(
            ui,
            &bridge,
            self.args.version.as_deref(),
            VersionFilter::Any,
            "Which version do you want to set up?",
        )?
        else {
            return Ok(CommandResult::failure(1));
        };

        run_setup(&self.ctx, ui, self.mode(), &version)
    }
}

/// Run a setup workflow for `version` and report where it left the version.
pub fn run_setup(
    ctx: &AppContext,
    ui: &mut dyn UserInterface,
    mode: SetupMode,
    version: &str,
) -> Result<CommandResult> {
    ui.show_header(&format!("Setting up {}", version));
    let bridge = ctx.bridge();

    let outcome = CommandSequencer::new(&bridge).run_setup(mode, version, &mut UiObserver::new(ui))?;
    match outcome {
        Some(FallbackOutcome::Remote) => ui.success("Pre-built indexes downloaded"),
        Some(FallbackOutcome::Local { .. }) => ui.success("Indexes generated locally"),
        None => ui.success("Complete setup finished"),
    }

    let ready = bridge
        .list_versions()
        .map(|versions| versions.iter().any(|v| v.id == version && v.is_ready_derived()));
    match ready {
        Ok(true) => ui.message(&format!(
            "Version {} is ready. Run 'ifs-mcp serve {}' to start the server.",
            version, version
        )),
        Ok(false) => ui.message(&format!(
            "Version {} still needs a vector index. Run 'ifs-mcp embed {}' before serving it.",
            version, version
        )),
        Err(e) => tracing::warn!("Could not re-read versions after setup: {}", e),
    }
    Ok(CommandResult::success())
}

/// Offer a setup workflow when no version is ready to serve.
pub fn offer_setup(
    ctx: &AppContext,
    ui: &mut dyn UserInterface,
    versions: &[VersionRecord],
) -> Result<CommandResult> {
    if versions.is_empty() {
        ui.message("No IFS Cloud versions imported yet. Import one with 'ifs-mcp import <zip>'.");
        return Ok(CommandResult::success());
    }

    let choice = choose(
        ui,
        "setup_mode",
        "No version is ready to serve. How do you want to set one up?",
        vec![
            PromptOption::new("Fast setup (download pre-built indexes)", "fast"),
            PromptOption::new("Complete setup (compute everything locally)", "complete"),
            PromptOption::new("Not now", "skip"),
        ],
        Some("fast"),
    )?;

    let mode = match choice.as_deref() {
        Some("fast") => SetupMode::Fast,
        Some("complete") => SetupMode::Complete {
            embeddings: confirm(
                ui,
                "embeddings",
                "Also build vector embeddings? Needed for serving, but slow without a GPU.",
                true,
            )?,
        },
        _ => return Ok(CommandResult::success()),
    };

    match pick_from(ui, versions, VersionFilter::Any, "Which version do you want to set up?")? {
        Some(version) => run_setup(ctx, ui, mode, &version),
        None => Ok(CommandResult::failure(1)),
    }
}
