//! ifs-mcp - Install, set up and run the IFS Cloud MCP server.
//!
//! The MCP server itself is a Python tool run through the `uv` package
//! manager. This crate is the orchestration layer around it: it installs
//! and updates the tool, provisions its runtime, drives its subcommands,
//! classifies their failures, and keeps at most one long-lived server per
//! session.
//!
//! # Modules
//!
//! - [`bridge`] - Runs tool subcommands through the resolved package manager
//! - [`classify`] - Turns failures into structured, actionable errors
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Settings file loading and platform paths
//! - [`environment`] - Package manager discovery
//! - [`error`] - Error types and result aliases
//! - [`install`] - Installation, update and runtime provisioning
//! - [`sequencer`] - Ordered tool pipelines with remote-first fallback
//! - [`session`] - The long-lived MCP server process
//! - [`shell`] - Process execution
//! - [`status`] - Status aggregation and reports
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//! - [`versions`] - Dataset version records and readiness
//!
//! # Example
//!
//! ```
//! use ifs_mcp::versions::{derive_status, Status, VersionFlags, VersionRecord};
//!
//! let ready = VersionRecord {
//!     id: "25.1.0".to_string(),
//!     flags: VersionFlags {
//!         has_rank: true,
//!         has_lexical_index: true,
//!         has_vector_index: true,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! assert_eq!(derive_status(&[ready], false), Status::VersionsReady(1));
//! ```

pub mod bridge;
pub mod classify;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod install;
pub mod sequencer;
pub mod session;
pub mod shell;
pub mod status;
pub mod ui;
pub mod versions;

pub use error::{McpError, Result};
