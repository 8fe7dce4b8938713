//! Serve command implementation.
//!
//! `ifs-mcp serve` runs the MCP server in the foreground with its stdio
//! bridged to ours, so an MCP client can launch `ifs-mcp serve <version>`
//! directly. Nothing else may be written to stdout once the server runs.

use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::ui::UserInterface;
use crate::versions::ready_versions;

use super::dispatcher::{AppContext, Command, CommandResult};
use super::pickers::{pick_from, VersionFilter};
use super::setup::offer_setup;

/// The serve command implementation.
pub struct ServeCommand {
    ctx: AppContext,
    version: Option<String>,
}

impl ServeCommand {
    pub fn new(ctx: AppContext, version: Option<String>) -> Self {
        Self { ctx, version }
    }
}

impl Command for ServeCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let version = match &self.version {
            Some(version) => version.clone(),
            None => {
                let versions = self.ctx.bridge().list_versions()?;
                if ready_versions(&versions).is_empty() {
                    return offer_setup(&self.ctx, ui, &versions);
                }
                match pick_from(
                    ui,
                    &versions,
                    VersionFilter::Ready,
                    "Which version should the server use?",
                )? {
                    Some(version) => version,
                    None => return Ok(CommandResult::failure(1)),
                }
            }
        };

        let cwd = std::env::current_dir()?;
        serve_version(
            &self.ctx,
            &version,
            &cwd,
            std::io::stdin(),
            &mut std::io::stdout(),
        )
    }
}

/// Serve `version` over `input`/`output` until the server exits.
///
/// The server's exit code becomes the command's exit code.
pub fn serve_version<R, W>(
    ctx: &AppContext,
    version: &str,
    cwd: &Path,
    input: R,
    output: &mut W,
) -> Result<CommandResult>
where
    R: Read + Send + 'static,
    W: Write,
{
    let mut session = ctx.session();
    match session.serve(version, cwd, input, output)? {
        Some(0) => Ok(CommandResult::success()),
        Some(code) => Ok(CommandResult::failure(code)),
        None => Ok(CommandResult::failure(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::test_support::context;
    use crate::error::McpError;
    use crate::shell::Invocation;
    use crate::ui::MockUI;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn no_ready_version_offers_setup() {
        let temp = TempDir::new().unwrap();
        let (ctx, runner) = context(&temp, |r| {
            r.on_ok("list --json", r#"[{"version": "25.1.0", "has_analysis": true}]"#);
        });
        let mut ui = MockUI::new();
        ui.set_prompt_response("setup_mode", "skip");

        let result = ServeCommand::new(ctx, None).execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.was_prompted("setup_mode"));
        assert!(!runner.calls().iter().any(|c| c.spawned));
    }

    #[test]
    fn failed_preflight_refuses_to_start() {
        let temp = TempDir::new().unwrap();
        let (ctx, runner) = context(&temp, |r| {
            r.on_fail("--help", 1, "ModuleNotFoundError: No module named 'src'");
        });

        let mut output = Vec::new();
        let err = serve_version(&ctx, "25.1.0", temp.path(), Cursor::new(Vec::new()), &mut output)
            .unwrap_err();

        assert!(matches!(err, McpError::ToolFailed(_)));
        assert!(!runner.calls().iter().any(|c| c.spawned));
        assert!(output.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn serves_and_propagates_exit_code() {
        let temp = TempDir::new().unwrap();
        let (ctx, runner) = context(&temp, |r| {
            r.on_ok("--help", "usage: main");
            r.set_spawn_substitute(
                Invocation::new("sh").args(["-c", "cat; exit 3"]),
            );
        });

        let mut output = Vec::new();
        let result = serve_version(
            &ctx,
            "25.1.0",
            temp.path(),
            Cursor::new(b"{\"id\":1}\n".to_vec()),
            &mut output,
        )
        .unwrap();

        assert_eq!(result.exit_code, 3);
        assert_eq!(output, b"{\"id\":1}\n");
        let spawned = runner.calls().into_iter().find(|c| c.spawned).unwrap();
        assert!(spawned.line.contains("server --version 25.1.0 --name ifs-cloud-mcp-server --transport stdio"));
    }
}
