//! ifs-mcp CLI entry point.

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use ifs_mcp::cli::{report_error, AppContext, Cli, CommandDispatcher, Commands};
use ifs_mcp::shell::is_ci;
use ifs_mcp::ui::{create_ui, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Logs go to stderr: stdout carries the MCP protocol under `serve`.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("ifs_mcp=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ifs_mcp=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("ifs-mcp starting with args: {:?}", cli);

    let serving_stdio =
        matches!(cli.command, Some(Commands::Serve(_))) && !std::io::stdout().is_terminal();

    // Determine output mode
    let output_mode = if serving_stdio {
        OutputMode::Silent
    } else if cli.quiet {
        OutputMode::Quiet
    } else if cli.verbose {
        OutputMode::Verbose
    } else {
        OutputMode::Normal
    };

    // Handle --no-color
    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    let is_interactive = !cli.non_interactive && !is_ci() && std::io::stdin().is_terminal();
    let mut ui = create_ui(is_interactive, output_mode);
    let command = cli.command.as_ref().map_or("status", Commands::name);

    let context = match AppContext::load(cli.config.as_deref()) {
        Ok(context) => context,
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            return ExitCode::from(2);
        }
    };

    let dispatcher = CommandDispatcher::new(context);
    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(u8::try_from(result.exit_code).unwrap_or(1)),
        Err(e) => {
            tracing::debug!("'{}' failed: {:?}", command, e);
            report_error(ui.as_mut(), command, &e);
            ExitCode::from(1)
        }
    }
}
