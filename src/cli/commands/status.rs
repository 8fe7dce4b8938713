//! Status and report commands.
//!
//! `ifs-mcp status` shows the one-line status and the obvious next step;
//! `ifs-mcp report` prints the full text report.

use crate::bridge::CommandBridge;
use crate::error::Result;
use crate::session::ServerSession;
use crate::status::{
    decide_toggle, render_report, RecordingSurface, StatusAggregator, StatusSnapshot,
    StatusSurface, ToggleAction,
};
use crate::ui::{McpTheme, UserInterface};
use crate::versions::Status;

use super::dispatcher::{AppContext, Command, CommandResult};

/// Publishes status changes as UI messages.
pub struct StatusLine<'a> {
    ui: &'a mut dyn UserInterface,
}

impl<'a> StatusLine<'a> {
    pub fn new(ui: &'a mut dyn UserInterface) -> Self {
        Self { ui }
    }
}

impl StatusSurface for StatusLine<'_> {
    fn publish(&mut self, status: Status, detail: &str) {
        let line = format!("Status: {} ({})", status.label(), detail);
        match status {
            Status::ServerRunning | Status::VersionsReady(_) => self.ui.success(&line),
            Status::NotInstalled | Status::InstallInProgress => self.ui.message(&line),
            Status::NoVersions | Status::VersionsNeedSetup(_) => self.ui.warning(&line),
        }
    }
}

/// Refresh the status and publish it to the UI.
pub fn refresh_status(
    bridge: &CommandBridge,
    session: &mut ServerSession,
    ui: &mut dyn UserInterface,
) -> StatusSnapshot {
    let mut surface = StatusLine::new(ui);
    StatusAggregator::new(bridge, &mut surface).refresh(session)
}

/// The hint shown after the status line.
pub fn next_step_hint(action: &ToggleAction) -> &'static str {
    match action {
        ToggleAction::StopServer => "The server is running in this session.",
        ToggleAction::StartServer { .. } => "Next: run 'ifs-mcp serve' to start the MCP server.",
        ToggleAction::GuideSetup => {
            "Next: import a version with 'ifs-mcp import <zip>', then run 'ifs-mcp setup'."
        }
        ToggleAction::OfferInstall => "Next: run 'ifs-mcp install'.",
        ToggleAction::Wait => "Wait for the running installation to finish.",
    }
}

/// The status command implementation.
pub struct StatusCommand {
    ctx: AppContext,
}

impl StatusCommand {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

impl Command for StatusCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        ui.show_header("IFS Cloud MCP Server");

        let bridge = self.ctx.bridge();
        let mut session = self.ctx.session();
        let snapshot = refresh_status(&bridge, &mut session, ui);

        let theme = McpTheme::detect();
        for v in &snapshot.versions {
            ui.message(&format!("  {}", theme.format_version(v)));
        }
        for id in &snapshot.disagreements {
            ui.warning(&format!(
                "Version {} reports a readiness its artifacts do not support",
                id
            ));
        }

        let action = decide_toggle(snapshot.status, &snapshot.versions);
        ui.message("");
        ui.message(next_step_hint(&action));
        Ok(CommandResult::success())
    }
}

/// The report command implementation.
pub struct ReportCommand {
    ctx: AppContext,
}

impl ReportCommand {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

impl Command for ReportCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let bridge = self.ctx.bridge();
        let mut session = self.ctx.session();
        let mut surface = RecordingSurface::new();
        let snapshot = StatusAggregator::new(&bridge, &mut surface).refresh(&mut session);

        ui.message(&render_report(&snapshot));
        Ok(CommandResult::success())
    }
}
