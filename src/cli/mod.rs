//! Command-line interface for ifs-mcp.
//!
//! This module provides the CLI argument parsing using clap's derive macros
//! and command implementations.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, DeleteArgs, EmbedArgs, ImportArgs, InstallArgs, ListArgs, SetupArgs,
    SetupKind, VersionArgs,
};
pub use commands::{report_error, AppContext, Command, CommandDispatcher, CommandResult};
