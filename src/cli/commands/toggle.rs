//! Toggle command implementation.
//!
//! `ifs-mcp toggle` does whatever the current status suggests: install when
//! nothing is installed, guide to setup when no version is ready, and serve
//! a ready version in the foreground otherwise.

use crate::error::Result;
use crate::status::{decide_toggle, ToggleAction};
use crate::ui::{choose, confirm, PromptOption, UserInterface};

use super::dispatcher::{AppContext, Command, CommandResult};
use super::install::report_install;
use super::serve::serve_version;
use super::setup::offer_setup;
use super::status::refresh_status;

/// The toggle command implementation.
pub struct ToggleCommand {
    ctx: AppContext,
}

impl ToggleCommand {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

impl Command for ToggleCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let bridge = self.ctx.bridge();
        let mut session = self.ctx.session();
        let snapshot = refresh_status(&bridge, &mut session, ui);

        match decide_toggle(snapshot.status, &snapshot.versions) {
            ToggleAction::OfferInstall => {
                if confirm(ui, "install", "Install the IFS Cloud MCP server now?", true)? {
                    let outcome = self.ctx.orchestrator().install(ui)?;
                    Ok(report_install(ui, &outcome))
                } else {
                    Ok(CommandResult::success())
                }
            }
            ToggleAction::GuideSetup => offer_setup(&self.ctx, ui, &snapshot.versions),
            ToggleAction::StartServer { ready } => {
                let options = ready
                    .iter()
                    .map(|id| PromptOption::new(id.as_str(), id.as_str()))
                    .collect();
                let default = ready.first().cloned();
                let Some(version) = choose(
                    ui,
                    "version",
                    "Which version should the server use?",
                    options,
                    default.as_deref(),
                )?
                else {
                    return Ok(CommandResult::success());
                };
                ui.message(&format!("Serving {} on stdio. Press Ctrl+C to stop.", version));
                let cwd = std::env::current_dir()?;
                serve_version(
                    &self.ctx,
                    &version,
                    &cwd,
                    std::io::stdin(),
                    &mut std::io::stdout(),
                )
            }
            // A fresh session never owns a server; only `console` can stop one.
            ToggleAction::StopServer => Ok(CommandResult::success()),
            ToggleAction::Wait => {
                ui.warning("Another installation is in progress. Try again when it has finished.");
                Ok(CommandResult::failure(1))
            }
        }
    }
}
