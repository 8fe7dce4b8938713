//! Running the server's CLI through the resolved package manager.
//!
//! Every call has the shape `<uv> run python -m <entry_module> <command>
//! <args…>`. Both modes first check that the install root exists and fail
//! with [`McpError::NotInstalled`] before resolving or spawning anything.

use std::path::Path;
use std::sync::Arc;

use crate::classify::StructuredError;
use crate::config::{AppPaths, Settings};
use crate::environment::{EnvironmentResolver, ResolvedEnvironment};
use crate::error::{McpError, Result};
use crate::shell::{CommandOptions, CommandResult, Invocation, ProcessHandle, ProcessRunner};
use crate::versions::{parse_version_list, VersionRecord};

/// Executes tool subcommands.
#[derive(Clone)]
pub struct CommandBridge {
    paths: AppPaths,
    entry_module: String,
    max_output_bytes: usize,
    runner: Arc<dyn ProcessRunner>,
}

impl std::fmt::Debug for CommandBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBridge")
            .field("paths", &self.paths)
            .field("entry_module", &self.entry_module)
            .field("max_output_bytes", &self.max_output_bytes)
            .finish()
    }
}

impl CommandBridge {
    pub fn new(paths: AppPaths, settings: &Settings, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            paths,
            entry_module: settings.entry_module.clone(),
            max_output_bytes: settings.max_output_bytes,
            runner,
        }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    /// Check the install root, then resolve the package manager.
    pub fn resolve(&self) -> Result<ResolvedEnvironment> {
        if !self.paths.is_installed() {
            return Err(McpError::NotInstalled {
                root: self.paths.install_root().to_path_buf(),
            });
        }
        EnvironmentResolver::new(self.paths.install_root()).resolve(self.runner())
    }

    /// Full invocation for a tool subcommand.
    pub fn tool_invocation(
        &self,
        env: &ResolvedEnvironment,
        command: &str,
        args: &[&str],
    ) -> Invocation {
        env.tool_command(["run", "python", "-m", self.entry_module.as_str(), command])
            .args(args.iter().copied())
    }

    /// Buffered call with the install root as working directory.
    ///
    /// A non-zero exit is returned in the result, not as an error.
    pub fn run(&self, command: &str, args: &[&str]) -> Result<CommandResult> {
        let env = self.resolve()?;
        let invocation = self.tool_invocation(&env, command, args);
        let options = CommandOptions::in_dir(self.paths.install_root())
            .with_limit(self.max_output_bytes);
        self.runner.run(&invocation, &options)
    }

    /// Buffered call that turns a non-zero exit into a classified
    /// [`McpError::ToolFailed`].
    pub fn run_checked(&self, command: &str, args: &[&str]) -> Result<CommandResult> {
        let result = self.run(command, args)?;
        if result.success {
            Ok(result)
        } else {
            Err(McpError::ToolFailed(Box::new(StructuredError::from_result(
                command, &result,
            ))))
        }
    }

    /// Start a long-lived process and return without waiting.
    ///
    /// The caller owns the returned handle and must drain its pipes.
    pub fn spawn_long_running(
        &self,
        command: &str,
        args: &[&str],
        cwd: &Path,
    ) -> Result<ProcessHandle> {
        let env = self.resolve()?;
        let invocation = self.tool_invocation(&env, command, args);
        tracing::info!("Starting long-running process: {}", invocation);
        self.runner.spawn(&invocation, &CommandOptions::in_dir(cwd))
    }

    /// `list --json`, parsed.
    pub fn list_versions(&self) -> Result<Vec<VersionRecord>> {
        let result = self.run_checked("list", &["--json"])?;
        parse_version_list(&result.stdout).map_err(|e| {
            McpError::Other(anyhow::anyhow!("Failed to parse version list: {}", e))
        })
    }
}
