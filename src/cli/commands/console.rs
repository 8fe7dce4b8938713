//! Console command implementation.
//!
//! `ifs-mcp console` is an interactive menu over one [`ServerSession`]: the
//! server it starts keeps running in the background until it is stopped
//! from the menu or the console exits.

use std::path::Path;

use crate::error::Result;
use crate::session::ServerSession;
use crate::status::{render_report, StatusSnapshot};
use crate::ui::{choose, PromptOption, UserInterface};
use crate::versions::Status;

use super::display::report_error;
use super::dispatcher::{AppContext, Command, CommandResult};
use super::install::report_install;
use super::pickers::{pick_from, VersionFilter};
use super::setup::offer_setup;
use super::status::refresh_status;

/// The console command implementation.
pub struct ConsoleCommand {
    ctx: AppContext,
}

impl ConsoleCommand {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    fn menu(snapshot: &StatusSnapshot) -> Vec<PromptOption> {
        let mut options = Vec::new();
        match snapshot.status {
            Status::ServerRunning => options.push(PromptOption::new("Stop the server", "stop")),
            Status::VersionsReady(_) => options.push(PromptOption::new("Start the server", "start")),
            _ => {}
        }
        if matches!(
            snapshot.status,
            Status::NoVersions | Status::VersionsNeedSetup(_) | Status::VersionsReady(_)
        ) {
            options.push(PromptOption::new("Set up a version", "setup"));
        }
        if snapshot.status != Status::InstallInProgress && snapshot.status != Status::ServerRunning {
            options.push(PromptOption::new("Install or update", "install"));
        }
        options.push(PromptOption::new("Show report", "report"));
        options.push(PromptOption::new("Refresh", "refresh"));
        options.push(PromptOption::new("Quit", "quit"));
        options
    }

    fn start(
        &self,
        ui: &mut dyn UserInterface,
        session: &mut ServerSession,
        snapshot: &StatusSnapshot,
        cwd: &Path,
    ) -> Result<()> {
        let Some(version) = pick_from(
            ui,
            &snapshot.versions,
            VersionFilter::Ready,
            "Which version should the server use?",
        )?
        else {
            return Ok(());
        };
        let pid = session.start(&version, cwd)?;
        ui.success(&format!("MCP server started for {} (pid {})", version, pid));
        Ok(())
    }

    fn stop(ui: &mut dyn UserInterface, session: &mut ServerSession) -> Result<()> {
        if session.stop()? {
            ui.success("MCP server stopped");
        } else {
            ui.warning("MCP server did not exit in time and was killed");
        }
        Ok(())
    }
}

impl Command for ConsoleCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if !ui.is_interactive() {
            ui.error("The console needs an interactive terminal. Use 'ifs-mcp serve' instead.");
            return Ok(CommandResult::failure(2));
        }

        let bridge = self.ctx.bridge();
        let mut session = self.ctx.session();
        let cwd = std::env::current_dir()?;
        ui.show_header("IFS Cloud MCP Server");

        loop {
            let snapshot = refresh_status(&bridge, &mut session, ui);
            let options = Self::menu(&snapshot);
            let default = options[0].value.clone();
            let action = choose(ui, "console_action", "What would you like to do?", options, Some(&default))?;

            let (command, outcome) = match action.as_deref() {
                Some("start") => ("server", self.start(ui, &mut session, &snapshot, &cwd)),
                Some("stop") => ("server", Self::stop(ui, &mut session)),
                Some("setup") => {
                    // Setup only offers versions that are not ready yet.
                    let pending: Vec<_> = snapshot
                        .versions
                        .iter()
                        .filter(|v| !v.is_ready_derived())
                        .cloned()
                        .collect();
                    let versions = if pending.is_empty() { snapshot.versions.clone() } else { pending };
                    ("setup", offer_setup(&self.ctx, ui, &versions).map(|_| ()))
                }
                Some("install") => (
                    "install",
                    self.ctx
                        .orchestrator()
                        .install(ui)
                        .map(|outcome| {
                            report_install(ui, &outcome);
                        }),
                ),
                Some("report") => {
                    ui.message(&render_report(&snapshot));
                    continue;
                }
                Some("refresh") => continue,
                _ => break,
            };
            if let Err(e) = outcome {
                report_error(ui, command, &e);
            }
        }

        if session.running().is_some() {
            ui.message("Stopping the MCP server...");
            Self::stop(ui, &mut session)?;
        }
        Ok(CommandResult::success())
    }
}
