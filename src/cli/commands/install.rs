//! Install command implementation.
//!
//! `ifs-mcp install` installs the MCP server, or reconciles an existing
//! install against the latest remote version.

use crate::cli::args::InstallArgs;
use crate::error::Result;
use crate::install::{InstallOutcome, ProvisionOutcome};
use crate::ui::UserInterface;

use super::dispatcher::{AppContext, Command, CommandResult};

/// The install command implementation.
pub struct InstallCommand {
    ctx: AppContext,
    args: InstallArgs,
}

impl InstallCommand {
    pub fn new(ctx: AppContext, args: InstallArgs) -> Self {
        Self { ctx, args }
    }
}

impl Command for InstallCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let orchestrator = self.ctx.orchestrator();

        if self.args.runtime_only {
            let runtime = orchestrator.provision_runtime(ui)?;
            match runtime {
                ProvisionOutcome::Provisioned { variant, .. } => {
                    ui.success(&format!("Runtime provisioned ({} build)", variant))
                }
                ProvisionOutcome::DependenciesSkipped { .. } => {
                    ui.warning("Runtime provisioned without dependencies (no pyproject.toml)")
                }
                ProvisionOutcome::Cancelled => ui.warning("Runtime provisioning cancelled"),
            }
            return Ok(runtime_result(runtime));
        }

        let outcome = if self.args.reinstall {
            orchestrator.reinstall(ui)?
        } else if self.args.update {
            if self.ctx.paths.is_installed() {
                orchestrator.update(ui)?
            } else {
                ui.message("Nothing to update yet; installing instead.");
                orchestrator.fresh_install(ui)?
            }
        } else {
            orchestrator.install(ui)?
        };

        Ok(report_install(ui, &outcome))
    }
}

fn runtime_result(runtime: ProvisionOutcome) -> CommandResult {
    match runtime {
        ProvisionOutcome::Cancelled => CommandResult::failure(1),
        _ => CommandResult::success(),
    }
}

/// Print the next step after an install and map the outcome to a result.
pub fn report_install(ui: &mut dyn UserInterface, outcome: &InstallOutcome) -> CommandResult {
    tracing::debug!("Install outcome: {:?}", outcome);
    match outcome {
        InstallOutcome::Installed { runtime, .. } | InstallOutcome::Updated { runtime } => {
            if *runtime == ProvisionOutcome::Cancelled {
                return CommandResult::failure(1);
            }
            ui.message("Next: import a version with 'ifs-mcp import <zip>', then run 'ifs-mcp setup'.");
            CommandResult::success()
        }
        InstallOutcome::Unchanged => {
            ui.message("Installation left unchanged.");
            CommandResult::success()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::BuildVariant;
    use crate::ui::MockUI;

    #[test]
    fn installed_points_to_import() {
        let mut ui = MockUI::new();
        let outcome = InstallOutcome::Installed {
            strategy: "git",
            runtime: ProvisionOutcome::Provisioned {
                variant: BuildVariant::Cpu,
                portable: false,
            },
        };

        let result = report_install(&mut ui, &outcome);

        assert!(result.success);
        assert!(ui.has_message("ifs-mcp import"));
    }

    #[test]
    fn cancelled_runtime_fails() {
        let mut ui = MockUI::new();
        let outcome = InstallOutcome::Updated {
            runtime: ProvisionOutcome::Cancelled,
        };
        assert_eq!(report_install(&mut ui, &outcome).exit_code, 1);
        assert_eq!(runtime_result(ProvisionOutcome::Cancelled).exit_code, 1);
        assert!(runtime_result(ProvisionOutcome::DependenciesSkipped { portable: true }).success);
    }

    #[test]
    fn unchanged_is_success() {
        let mut ui = MockUI::new();
        let result = report_install(&mut ui, &InstallOutcome::Unchanged);
        assert!(result.success);
        assert!(ui.has_message("unchanged"));
    }
}
