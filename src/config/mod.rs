//! Settings loading and platform path resolution.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Install root, data root and derived locations in [`paths`]
//!
//! # Example
//!
//! ```
//! use ifs_mcp::config::{parse_settings, AppPaths};
//! use std::path::Path;
//!
//! let settings = parse_settings("python_version: '3.12'", Path::new("config.yml")).unwrap();
//! assert_eq!(settings.python_version, "3.12");
//!
//! let paths = AppPaths::new("/data/ifs/server", "/data/ifs");
//! assert_eq!(paths.venv_dir(), Path::new("/data/ifs/server/venv"));
//! ```
//!
//! # Settings File Location
//!
//! Settings are read from `<config_dir>/ifs-mcp/config.yml` unless
//! `--config` names another file. A missing file means "all defaults".

pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::{default_settings_path, load_settings, parse_settings};
pub use paths::AppPaths;
pub use schema::Settings;
