//! Ways of getting the server source onto disk.
//!
//! Every strategy writes into a staging directory beside the install root.
//! [`acquire_into_root`] renames a finished staging directory onto the root,
//! so the root only ever appears fully populated.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::classify::StructuredError;
use crate::config::{AppPaths, Settings};
use crate::error::{McpError, Result};
use crate::shell::{CommandOptions, Invocation, ProcessRunner};
use crate::ui::UserInterface;

use super::download::{archive_format_for, extract_archive, flatten_single_dir, Downloader};

/// One way of producing a copy of the server source.
pub trait AcquisitionStrategy {
    /// Short name used in logs and messages.
    fn name(&self) -> &'static str;

    /// Whether the strategy can run on this machine.
    fn is_available(&self) -> bool;

    /// Populate `staging`, which does not exist yet.
    fn acquire(&self, staging: &Path, ui: &mut dyn UserInterface) -> Result<()>;
}

/// Shallow `git clone` of the configured branch.
pub struct GitStrategy {
    repository_url: String,
    branch: String,
    runner: Arc<dyn ProcessRunner>,
}

impl GitStrategy {
    pub fn new(settings: &Settings, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            repository_url: settings.repository_url.clone(),
            branch: settings.branch.clone(),
            runner,
        }
    }
}

impl AcquisitionStrategy for GitStrategy {
    fn name(&self) -> &'static str {
        "git"
    }

    fn is_available(&self) -> bool {
        self.runner.probe(&Invocation::new("git").arg("--version"))
    }

    fn acquire(&self, staging: &Path, ui: &mut dyn UserInterface) -> Result<()> {
        let mut spinner = ui.start_spinner(&format!("Cloning {}", self.repository_url));
        let invocation = Invocation::new("git")
            .args(["clone", "--depth", "1", "--branch"])
            .arg(self.branch.as_str())
            .arg(self.repository_url.as_str())
            .arg(staging.to_string_lossy());

        let result = self.runner.run(&invocation, &CommandOptions::default())?;
        if result.success {
            spinner.finish_success("Repository cloned");
            Ok(())
        } else {
            spinner.finish_error("Clone failed");
            Err(McpError::ToolFailed(Box::new(StructuredError::from_result(
                "git clone",
                &result,
            ))))
        }
    }
}

/// Download of a source archive, unpacked and flattened.
pub struct ArchiveStrategy {
    archive_url: String,
    runner: Arc<dyn ProcessRunner>,
}

impl ArchiveStrategy {
    pub fn new(settings: &Settings, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            archive_url: settings.archive_url.clone(),
            runner,
        }
    }
}

impl AcquisitionStrategy for ArchiveStrategy {
    fn name(&self) -> &'static str {
        "archive"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn acquire(&self, staging: &Path, ui: &mut dyn UserInterface) -> Result<()> {
        let format = archive_format_for(&self.archive_url);
        let mut archive_name = staging.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        archive_name.push(format.extension());
        let archive = staging.with_file_name(archive_name);

        let mut spinner = ui.start_spinner(&format!("Downloading {}", self.archive_url));
        let downloaded = Downloader::new().and_then(|d| d.download(&self.archive_url, &archive));
        if let Err(e) = downloaded {
            spinner.finish_error("Download failed");
            return Err(e);
        }

        spinner.set_message("Extracting archive");
        let extracted = fs::create_dir_all(staging)
            .map_err(McpError::from)
            .and_then(|_| extract_archive(self.runner.as_ref(), &archive, staging, format))
            .and_then(|_| flatten_single_dir(staging));
        if let Err(e) = fs::remove_file(&archive) {
            tracing::warn!("Failed to remove {}: {}", archive.display(), e);
        }

        match extracted {
            Ok(()) => {
                spinner.finish_success("Archive extracted");
                Ok(())
            }
            Err(e) => {
                spinner.finish_error("Extraction failed");
                Err(e)
            }
        }
    }
}

/// The built-in strategies in preference order.
pub fn default_strategies(
    settings: &Settings,
    runner: Arc<dyn ProcessRunner>,
) -> Vec<Box<dyn AcquisitionStrategy>> {
    vec![
        Box::new(GitStrategy::new(settings, runner.clone())),
        Box::new(ArchiveStrategy::new(settings, runner)),
    ]
}

/// Try each available strategy in order until one fills a staging
/// directory, then move it onto the install root.
///
/// The root must not exist. Returns the name of the strategy that won.
/// When every strategy fails, the last error is returned and no staging
/// directory is left behind.
pub fn acquire_into_root(
    strategies: &[Box<dyn AcquisitionStrategy>],
    paths: &AppPaths,
    ui: &mut dyn UserInterface,
) -> Result<&'static str> {
    fs::create_dir_all(paths.install_parent())?;

    let mut last_error = None;
    for strategy in strategies {
        if !strategy.is_available() {
            tracing::info!("Skipping {} acquisition: not available", strategy.name());
            continue;
        }

        let staging = paths.staging_dir(std::process::id(), chrono::Utc::now().timestamp_millis());
        remove_dir_if_present(&staging);
        tracing::info!(
            "Acquiring server source via {} into {}",
            strategy.name(),
            staging.display()
        );

        match strategy.acquire(&staging, ui) {
            Ok(()) => {
                fs::rename(&staging, paths.install_root()).inspect_err(|_| {
                    remove_dir_if_present(&staging);
                })?;
                tracing::info!("Installed via {} at {}", strategy.name(), paths.install_root().display());
                return Ok(strategy.name());
            }
            Err(e) => {
                tracing::info!("{} acquisition failed, trying next strategy: {}", strategy.name(), e);
                remove_dir_if_present(&staging);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        McpError::Other(anyhow::anyhow!("No acquisition strategy is available"))
    }))
}

/// Remove leftovers of interrupted acquisitions.
///
/// Only call while holding the install lock: any staging directory found
/// then belongs to a process that is gone.
pub fn clean_stale_staging(paths: &AppPaths) {
    let Ok(entries) = fs::read_dir(paths.install_parent()) else {
        return;
    };
    let prefix = paths.staging_prefix();
    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            tracing::info!("Removing stale staging directory {}", entry.path().display());
            remove_dir_if_present(&entry.path());
        }
    }
}

pub(crate) fn remove_dir_if_present(path: &Path) {
    let removed = if path.is_dir() {
        fs::remove_dir_all(path)
    } else if path.exists() {
        fs::remove_file(path)
    } else {
        return;
    };
    if let Err(e) = removed {
        tracing::warn!("Failed to remove {}: {}", path.display(), e);
    }
}
