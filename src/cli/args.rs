//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// ifs-mcp - Install, set up and run the IFS Cloud MCP server.
#[derive(Debug, Parser)]
#[command(name = "ifs-mcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to settings file (overrides the platform default)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use defaults and IFS_MCP_PROMPT_* answers, never prompt
    #[arg(long, global = true)]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install, update or reinstall the MCP server
    Install(InstallArgs),

    /// Show the current status (default if no command specified)
    Status,

    /// Print a detailed status report
    Report,

    /// Do the obvious next thing: install, set up or start the server
    Toggle,

    /// Interactive menu that keeps the server running in the background
    Console,

    /// List imported IFS Cloud versions
    List(ListArgs),

    /// Import an IFS Cloud version from a ZIP archive
    Import(ImportArgs),

    /// Delete an imported version and its indexes
    Delete(DeleteArgs),

    /// Download pre-built indexes for a version
    Download(VersionArgs),

    /// Analyze a version's source files
    Analyze(VersionArgs),

    /// Calculate the dependency rank of an analyzed version
    CalculateRank(VersionArgs),

    /// Build vector embeddings for an analyzed version
    Embed(EmbedArgs),

    /// Rebuild the lexical search index of an analyzed version
    ReindexLexical(VersionArgs),

    /// Prepare a version for serving
    Setup(SetupArgs),

    /// Run the MCP server on stdio
    Serve(VersionArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Commands {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Install(_) => "install",
            Commands::Status => "status",
            Commands::Report => "report",
            Commands::Toggle => "toggle",
            Commands::Console => "console",
            Commands::List(_) => "list",
            Commands::Import(_) => "import",
            Commands::Delete(_) => "delete",
            Commands::Download(_) => "download",
            Commands::Analyze(_) => "analyze",
            Commands::CalculateRank(_) => "calculate-rank",
            Commands::Embed(_) => "embed",
            Commands::ReindexLexical(_) => "reindex-lexical",
            Commands::Setup(_) => "setup",
            Commands::Serve(_) => "serve",
            Commands::Completions(_) => "completions",
        }
    }
}

/// Arguments for the `install` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InstallArgs {
    /// Pull the latest changes into an existing installation
    #[arg(long, conflicts_with = "reinstall")]
    pub update: bool,

    /// Delete the existing installation and install from scratch
    #[arg(long)]
    pub reinstall: bool,

    /// Only (re)provision the Python runtime and dependencies
    #[arg(long, conflicts_with_all = ["update", "reinstall"])]
    pub runtime_only: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `import` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ImportArgs {
    /// ZIP archive exported from IFS Cloud
    pub archive: PathBuf,
}

/// Arguments for commands that act on one version.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct VersionArgs {
    /// Version to act on (prompted for when omitted)
    pub version: Option<String>,
}

/// Arguments for the `delete` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct DeleteArgs {
    /// Version to delete (prompted for when omitted)
    pub version: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the `embed` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct EmbedArgs {
    /// Version to embed (prompted for when omitted)
    pub version: Option<String>,

    /// Skip the resource usage warning
    #[arg(short, long)]
    pub yes: bool,
}

/// Setup workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SetupKind {
    /// Download pre-built indexes, computing locally if none exist
    #[default]
    Fast,
    /// Compute all indexes locally
    Complete,
}

/// Arguments for the `setup` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SetupArgs {
    /// Setup workflow
    #[arg(long, value_enum, default_value_t = SetupKind::Fast)]
    pub mode: SetupKind,

    /// Version to set up (prompted for when omitted)
    pub version: Option<String>,

    /// Also build vector embeddings (complete setup only)
    #[arg(long)]
    pub embeddings: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
