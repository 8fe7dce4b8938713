//! Platform roots and the locations derived from them.
//!
//! The install root holds the server source, the managed venv and, when no
//! global package manager exists, the portable copy of it. The data root is
//! where the server itself keeps imported versions and their indexes.

use std::path::{Path, PathBuf};

use super::schema::Settings;

/// Environment variable overriding the install root.
pub const INSTALL_ROOT_ENV: &str = "IFS_MCP_INSTALL_ROOT";

/// Environment variable overriding the data root.
pub const DATA_ROOT_ENV: &str = "IFS_MCP_DATA_ROOT";

const APP_DIR: &str = "ifs_cloud_mcp_server";

/// Resolved filesystem layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    install_root: PathBuf,
    data_root: PathBuf,
}

impl AppPaths {
    /// Build a layout from explicit roots.
    pub fn new(install_root: impl Into<PathBuf>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            data_root: data_root.into(),
        }
    }

    /// Resolve the layout from the process environment and settings.
    pub fn resolve(settings: &Settings) -> Self {
        Self::resolve_with_env(settings, |key: &str| std::env::var(key))
    }

    /// Resolve with a custom env var lookup function.
    ///
    /// Priority: environment variable, then settings, then platform default.
    pub fn resolve_with_env<F>(settings: &Settings, env_fn: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let platform_data = default_data_root();

        let data_root = env_fn(DATA_ROOT_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| settings.data_root.clone())
            .unwrap_or_else(|| platform_data.clone());

        let install_root = env_fn(INSTALL_ROOT_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| settings.install_root.clone())
            .unwrap_or_else(|| platform_data.join("server"));

        Self {
            install_root,
            data_root,
        }
    }

    /// Directory containing the server source.
    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// Application-data root used by the server.
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Whether the install root exists on disk.
    pub fn is_installed(&self) -> bool {
        self.install_root.is_dir()
    }

    /// Managed virtual environment.
    pub fn venv_dir(&self) -> PathBuf {
        self.install_root.join("venv")
    }

    /// Directory holding the portable package manager.
    pub fn portable_tool_dir(&self) -> PathBuf {
        self.install_root.join("uv")
    }

    /// Platform-appropriate portable package manager executable.
    pub fn portable_tool_executable(&self) -> PathBuf {
        self.portable_tool_dir().join(tool_executable_name())
    }

    /// Project manifest of the server source.
    pub fn pyproject(&self) -> PathBuf {
        self.install_root.join("pyproject.toml")
    }

    /// Git metadata directory, present for clone installs.
    pub fn git_dir(&self) -> PathBuf {
        self.install_root.join(".git")
    }

    /// Directory containing the install root and its siblings.
    pub fn install_parent(&self) -> PathBuf {
        self.install_root
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn root_name(&self) -> String {
        self.install_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "server".to_string())
    }

    /// Advisory lock serializing install, reconcile and provisioning.
    ///
    /// Lives beside the root, never inside it, so holding the lock does not
    /// make the root exist.
    pub fn lock_path(&self) -> PathBuf {
        self.install_parent()
            .join(format!("{}.install.lock", self.root_name()))
    }

    /// Prefix shared by all staging directories of this root.
    pub fn staging_prefix(&self) -> String {
        format!(".{}.staging-", self.root_name())
    }

    /// A fresh staging directory path, sibling of the root.
    pub fn staging_dir(&self, pid: u32, timestamp: i64) -> PathBuf {
        self.install_parent()
            .join(format!("{}{}-{}", self.staging_prefix(), pid, timestamp))
    }

    /// Directory whose subdirectories are per-version index sets.
    pub fn indexes_dir(&self) -> PathBuf {
        self.data_root.join("indexes")
    }
}

/// Platform default data root: `<data_dir>/ifs_cloud_mcp_server`.
///
/// `dirs::data_dir` is `%APPDATA%` on Windows, `~/Library/Application
/// Support` on macOS and `$XDG_DATA_HOME` or `~/.local/share` elsewhere.
pub fn default_data_root() -> PathBuf {
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// File name of the package manager executable on this platform.
pub fn tool_executable_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "uv.exe"
    } else {
        "uv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::VarError;

    fn no_env(_: &str) -> Result<String, VarError> {
        Err(VarError::NotPresent)
    }

    #[test]
    fn env_overrides_settings() {
        let settings = Settings {
            install_root: Some(PathBuf::from("/from/settings")),
            ..Default::default()
        };
        let paths = AppPaths::resolve_with_env(&settings, |key| match key {
            INSTALL_ROOT_ENV => Ok("/from/env".to_string()),
            _ => Err(VarError::NotPresent),
        });
        assert_eq!(paths.install_root(), Path::new("/from/env"));
    }

    #[test]
    fn settings_override_platform_default() {
        let settings = Settings {
            data_root: Some(PathBuf::from("/srv/ifs")),
            ..Default::default()
        };
        let paths = AppPaths::resolve_with_env(&settings, no_env);
        assert_eq!(paths.data_root(), Path::new("/srv/ifs"));
    }

    #[test]
    fn default_install_root_is_under_data_root() {
        let paths = AppPaths::resolve_with_env(&Settings::default(), no_env);
        assert!(paths.install_root().ends_with("ifs_cloud_mcp_server/server"));
        assert!(paths.data_root().ends_with("ifs_cloud_mcp_server"));
    }

    #[test]
    fn empty_env_value_is_ignored() {
        let paths = AppPaths::resolve_with_env(&Settings::default(), |key| match key {
            DATA_ROOT_ENV => Ok(String::new()),
            _ => Err(VarError::NotPresent),
        });
        assert!(paths.data_root().ends_with("ifs_cloud_mcp_server"));
    }

    #[test]
    fn lock_and_staging_live_beside_root() {
        let paths = AppPaths::new("/data/ifs/server", "/data/ifs");
        assert_eq!(paths.lock_path(), Path::new("/data/ifs/server.install.lock"));

        let staging = paths.staging_dir(42, 1_700_000_000);
        assert_eq!(staging.parent(), Some(Path::new("/data/ifs")));
        assert!(!staging.starts_with(paths.install_root()));
        assert!(staging
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(".server.staging-42-"));
    }

    #[test]
    fn derived_locations() {
        let paths = AppPaths::new("/r", "/d");
        assert_eq!(paths.venv_dir(), Path::new("/r/venv"));
        assert_eq!(paths.pyproject(), Path::new("/r/pyproject.toml"));
        assert_eq!(paths.indexes_dir(), Path::new("/d/indexes"));
        assert!(paths
            .portable_tool_executable()
            .starts_with(Path::new("/r/uv")));
    }
}
