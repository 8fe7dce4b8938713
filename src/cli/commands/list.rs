//! List command implementation.
//!
//! The `ifs-mcp list` command lists imported versions with their artifacts.

use crate::cli::args::ListArgs;
use crate::error::{McpError, Result};
use crate::ui::theme::McpTheme;
use crate::ui::UserInterface;
use crate::versions::discover_index_versions;

use super::dispatcher::{AppContext, Command, CommandResult};

/// The list command implementation.
pub struct ListCommand {
    ctx: AppContext,
    args: ListArgs,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(ctx: AppContext, args: ListArgs) -> Self {
        Self { ctx, args }
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let versions = self.ctx.bridge().list_versions()?;

        if self.args.json {
            let json =
                serde_json::to_string_pretty(&versions).map_err(|e| McpError::Other(e.into()))?;
            ui.message(&json);
            return Ok(CommandResult::success());
        }

        if versions.is_empty() {
            ui.message("No IFS Cloud versions imported. Run 'ifs-mcp import <zip>' first.");
        } else {
            let theme = McpTheme::detect();
            ui.message(&format!("{} version(s):", versions.len()));
            for v in &versions {
                let state = if v.is_ready_derived() {
                    theme.success.apply_to("ready").to_string()
                } else {
                    theme.dim.apply_to("needs setup").to_string()
                };
                ui.message(&format!("  {}  [{}]", theme.format_version(v), state));
            }
        }

        let indexes = self.ctx.paths.indexes_dir();
        match discover_index_versions(&indexes) {
            Ok(on_disk) if !on_disk.is_empty() => {
                ui.message("");
                ui.message(&format!("Index data on disk: {}", on_disk.join(", ")));
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not scan {}: {}", indexes.display(), e),
        }

        Ok(CommandResult::success())
    }
}
