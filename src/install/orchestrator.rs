//! Install, update and reinstall of the MCP server.
//!
//! Every public operation holds the [`InstallLock`] from start to finish,
//! so a second orchestrator on the same root fails fast with
//! [`McpError::InstallInProgress`] instead of racing on staging directories.

use std::fs;
use std::sync::Arc;

use crate::config::{AppPaths, Settings};
use crate::error::{McpError, Result};
use crate::shell::{CommandOptions, Invocation, ProcessRunner};
use crate::ui::{choose, confirm, PromptOption, UserInterface};

use super::lock::InstallLock;
use super::runtime::{ProvisionOutcome, RuntimeProvisioner};
use super::strategy::{acquire_into_root, clean_stale_staging, default_strategies, AcquisitionStrategy};
use super::version::{current_version, latest_version};

/// What an install operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Fresh copy acquired via the named strategy and provisioned.
    Installed { strategy: &'static str, runtime: ProvisionOutcome },
    /// Existing checkout updated in place and re-provisioned.
    Updated { runtime: ProvisionOutcome },
    /// The existing install was left alone.
    Unchanged,
}

/// What reconcile offers for an existing install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOffer {
    /// Both versions known and different.
    UpdateOrReinstall { current: String, latest: String },
    /// Both versions known and equal.
    ReinstallAnyway { current: String },
    /// One of the versions could not be determined.
    ReinstallOnly,
}

impl ReconcileOffer {
    pub fn from_versions(current: Option<String>, latest: Option<String>) -> Self {
        match (current, latest) {
            (Some(current), Some(latest)) if current != latest => {
                ReconcileOffer::UpdateOrReinstall { current, latest }
            }
            (Some(current), Some(_)) => ReconcileOffer::ReinstallAnyway { current },
            _ => ReconcileOffer::ReinstallOnly,
        }
    }
}

/// Drives acquisition and runtime provisioning for one install root.
pub struct InstallOrchestrator {
    paths: AppPaths,
    settings: Settings,
    runner: Arc<dyn ProcessRunner>,
    strategies: Vec<Box<dyn AcquisitionStrategy>>,
    provisioner: RuntimeProvisioner,
}

impl InstallOrchestrator {
    /// Orchestrator with the default `[git, archive]` preference order.
    pub fn new(paths: AppPaths, settings: &Settings, runner: Arc<dyn ProcessRunner>) -> Self {
        let strategies = default_strategies(settings, runner.clone());
        let provisioner = RuntimeProvisioner::new(paths.clone(), settings, runner.clone());
        Self {
            paths,
            settings: settings.clone(),
            runner,
            strategies,
            provisioner,
        }
    }

    /// Replace the acquisition strategies, keeping their order.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn AcquisitionStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// Reconcile an existing install, or install fresh.
    pub fn install(&self, ui: &mut dyn UserInterface) -> Result<InstallOutcome> {
        let _lock = self.lock()?;
        if self.paths.is_installed() {
            self.reconcile_locked(ui)
        } else {
            self.fresh_install_locked(ui)
        }
    }

    /// Acquire and provision into a root that does not exist yet.
    pub fn fresh_install(&self, ui: &mut dyn UserInterface) -> Result<InstallOutcome> {
        let _lock = self.lock()?;
        self.fresh_install_locked(ui)
    }

    /// Compare installed and remote versions and offer update or reinstall.
    pub fn reconcile(&self, ui: &mut dyn UserInterface) -> Result<InstallOutcome> {
        let _lock = self.lock()?;
        self.reconcile_locked(ui)
    }

    /// Integrate remote changes in place, falling back to a reinstall.
    pub fn update(&self, ui: &mut dyn UserInterface) -> Result<InstallOutcome> {
        let _lock = self.lock()?;
        self.update_locked(ui)
    }

    /// Delete the root and install fresh.
    pub fn reinstall(&self, ui: &mut dyn UserInterface) -> Result<InstallOutcome> {
        let _lock = self.lock()?;
        self.reinstall_locked(ui)
    }

    /// Re-run runtime provisioning for the existing install.
    pub fn provision_runtime(&self, ui: &mut dyn UserInterface) -> Result<ProvisionOutcome> {
        let _lock = self.lock()?;
        if !self.paths.is_installed() {
            return Err(McpError::NotInstalled {
                root: self.paths.install_root().to_path_buf(),
            });
        }
        self.provisioner.provision(ui)
    }

    /// Current vs latest version comparison, without prompting.
    pub fn reconcile_offer(&self) -> ReconcileOffer {
        ReconcileOffer::from_versions(
            current_version(&self.paths, self.runner.as_ref()),
            latest_version(self.runner.as_ref(), &self.settings.repository_url),
        )
    }

    fn lock(&self) -> Result<InstallLock> {
        let lock = InstallLock::acquire(&self.paths.lock_path())?;
        clean_stale_staging(&self.paths);
        Ok(lock)
    }

    fn fresh_install_locked(&self, ui: &mut dyn UserInterface) -> Result<InstallOutcome> {
        ui.show_header("Installing IFS Cloud MCP Server");
        let strategy = acquire_into_root(&self.strategies, &self.paths, ui)?;
        let runtime = self.provisioner.provision(ui)?;
        report_runtime(ui, runtime, "Installation complete");
        Ok(InstallOutcome::Installed { strategy, runtime })
    }

    fn reconcile_locked(&self, ui: &mut dyn UserInterface) -> Result<InstallOutcome> {
        match self.reconcile_offer() {
            ReconcileOffer::UpdateOrReinstall { current, latest } => {
                let choice = choose(
                    ui,
                    "existing_install",
                    &format!("An update is available ({} → {}). What would you like to do?", current, latest),
                    vec![
                        PromptOption::new("Update", "update"),
                        PromptOption::new("Reinstall from scratch", "reinstall"),
                        PromptOption::new("Keep the current install", "keep"),
                    ],
                    Some("update"),
                )?;
                match choice.as_deref() {
                    Some("update") => self.update_locked(ui),
                    Some("reinstall") => self.reinstall_locked(ui),
                    _ => Ok(InstallOutcome::Unchanged),
                }
            }
            ReconcileOffer::ReinstallAnyway { current } => {
                let question = format!("Already up to date ({}). Reinstall anyway?", current);
                self.offer_reinstall(ui, &question)
            }
            ReconcileOffer::ReinstallOnly => self.offer_reinstall(
                ui,
                "The MCP server is installed but its version could not be determined. Reinstall?",
            ),
        }
    }

    fn offer_reinstall(&self, ui: &mut dyn UserInterface, question: &str) -> Result<InstallOutcome> {
        if confirm(ui, "reinstall", question, false)? {
            self.reinstall_locked(ui)
        } else {
            Ok(InstallOutcome::Unchanged)
        }
    }

    fn update_locked(&self, ui: &mut dyn UserInterface) -> Result<InstallOutcome> {
        match self.pull_in_place(ui) {
            Ok(()) => {
                let runtime = self.provisioner.provision(ui)?;
                report_runtime(ui, runtime, "Update complete");
                Ok(InstallOutcome::Updated { runtime })
            }
            Err(e) => {
                tracing::info!("In-place update failed, reinstalling: {}", e);
                ui.warning(&format!("Update failed ({}), reinstalling instead", e));
                self.reinstall_locked(ui)
            }
        }
    }

    fn pull_in_place(&self, ui: &mut dyn UserInterface) -> anyhow::Result<()> {
        if !self.paths.git_dir().exists() {
            anyhow::bail!("install is not a git checkout");
        }

        let mut spinner = ui.start_spinner("Fetching updates");
        let options = CommandOptions::in_dir(self.paths.install_root());
        for args in [
            ["fetch", "origin", self.settings.branch.as_str()],
            ["pull", "origin", self.settings.branch.as_str()],
        ] {
            let invocation = Invocation::new("git").args(args);
            let result = self.runner.run(&invocation, &options)?;
            if !result.success {
                spinner.finish_error("Update failed");
                anyhow::bail!("{} exited with {:?}: {}", invocation, result.exit_code, result.stderr.trim());
            }
        }
        spinner.finish_success("Source updated");
        Ok(())
    }

    fn reinstall_locked(&self, ui: &mut dyn UserInterface) -> Result<InstallOutcome> {
        if self.paths.is_installed() {
            tracing::info!("Removing {}", self.paths.install_root().display());
            fs::remove_dir_all(self.paths.install_root())?;
        }
        self.fresh_install_locked(ui)
    }
}

fn report_runtime(ui: &mut dyn UserInterface, runtime: ProvisionOutcome, done: &str) {
    match runtime {
        ProvisionOutcome::Provisioned { variant, portable } => {
            let via = if portable { "portable uv" } else { "uv" };
            ui.success(&format!("{} ({} build, {})", done, variant, via));
        }
        ProvisionOutcome::DependenciesSkipped { .. } => ui.success(done),
        ProvisionOutcome::Cancelled => {
            ui.warning("Dependency installation cancelled; run 'ifs-mcp install' again to finish");
        }
    }
}
