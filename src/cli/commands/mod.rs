//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`ifs-mcp install`, `ifs-mcp setup`)
//! - Shared initialization logic through [`AppContext`]
//! - Consistent global flag handling

pub mod completions;
pub mod console;
pub mod dispatcher;
pub mod display;
pub mod install;
pub mod list;
pub mod pickers;
pub mod serve;
pub mod setup;
pub mod status;
pub mod toggle;
pub mod tool;

pub use dispatcher::{AppContext, Command, CommandDispatcher, CommandResult};
pub use display::{report_error, UiObserver};
