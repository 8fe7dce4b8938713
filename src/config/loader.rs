//! Settings file discovery and loading.

use crate::config::schema::Settings;
use crate::error::{McpError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default settings location: `<config_dir>/ifs-mcp/config.yml`.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ifs-mcp").join("config.yml"))
}

/// Load settings from an explicit path, or from the default location.
///
/// An explicit path must exist. The default location is optional: when it
/// is absent the defaults are returned.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let (path, required) = match explicit {
        Some(p) => (Some(p.to_path_buf()), true),
        None => (default_settings_path(), false),
    };

    let Some(path) = path else {
        return Ok(Settings::default());
    };

    match fs::read_to_string(&path) {
        Ok(content) => {
            tracing::debug!("Loading settings from {}", path.display());
            parse_settings(&content, &path)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            Ok(Settings::default())
        }
        Err(e) => Err(McpError::Io(e)),
    }
}

/// Parse YAML content into [`Settings`].
///
/// Empty content yields the defaults.
pub fn parse_settings(content: &str, source_path: &Path) -> Result<Settings> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(content).map_err(|e| McpError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_content_is_default() {
        let settings = parse_settings("   \n", Path::new("c.yml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let err = parse_settings("branch: [", Path::new("/etc/ifs.yml")).unwrap_err();
        assert!(matches!(err, McpError::ConfigParseError { .. }));
        assert!(err.to_string().contains("/etc/ifs.yml"));
    }

    #[test]
    fn explicit_path_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yml");
        assert!(matches!(
            load_settings(Some(&missing)),
            Err(McpError::Io(_))
        ));
    }

    #[test]
    fn explicit_path_is_loaded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "shutdown_grace_secs: 5\nlog_level: DEBUG\n").unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.shutdown_grace_secs, 5);
        assert_eq!(settings.log_level, "DEBUG");
    }
}
