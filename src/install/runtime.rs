//! Provisioning the Python runtime of an installed server.
//!
//! Three steps, each fatal on failure: make sure a package manager exists
//! (downloading a portable `uv` if needed), recreate the managed virtual
//! environment, and sync dependencies for the chosen build variant.

use std::fmt;
use std::fs;
use std::sync::Arc;

use crate::classify::StructuredError;
use crate::config::{AppPaths, Settings};
use crate::environment::{EnvironmentResolver, ResolvedEnvironment};
use crate::error::{McpError, Result};
use crate::shell::{
    make_executable, native_archive_format, target_triple, CommandOptions, Invocation,
    ProcessRunner,
};
use crate::ui::{choose, PromptOption, UserInterface};

use super::download::{extract_archive, flatten_single_dir, Downloader};
use super::strategy::remove_dir_if_present;

/// Where portable package manager releases are downloaded from.
pub const UV_RELEASE_BASE: &str = "https://github.com/astral-sh/uv/releases/latest/download";

/// CUDA toolkit a GPU build targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CudaVersion {
    Cu129,
    Cu128,
    Cu126,
}

impl CudaVersion {
    /// Newest first.
    pub const ALL: [CudaVersion; 3] = [CudaVersion::Cu129, CudaVersion::Cu128, CudaVersion::Cu126];

    /// Dependency extra name in `pyproject.toml`.
    pub fn extra(self) -> &'static str {
        match self {
            CudaVersion::Cu129 => "gpu129",
            CudaVersion::Cu128 => "gpu128",
            CudaVersion::Cu126 => "gpu126",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CudaVersion::Cu129 => "CUDA 12.9 (recommended)",
            CudaVersion::Cu128 => "CUDA 12.8",
            CudaVersion::Cu126 => "CUDA 12.6",
        }
    }

    pub fn from_extra(extra: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.extra() == extra)
    }
}

/// Which set of dependencies `uv sync` installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildVariant {
    Cpu,
    Cuda(CudaVersion),
}

impl BuildVariant {
    pub fn extra(self) -> &'static str {
        match self {
            BuildVariant::Cpu => "cpu",
            BuildVariant::Cuda(v) => v.extra(),
        }
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildVariant::Cpu => write!(f, "CPU"),
            BuildVariant::Cuda(v) => write!(f, "GPU ({})", v.extra()),
        }
    }
}

/// How provisioning ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Venv created and dependencies installed.
    Provisioned { variant: BuildVariant, portable: bool },
    /// Venv created; no `pyproject.toml` to install from.
    DependenciesSkipped { portable: bool },
    /// The user backed out of the build choice.
    Cancelled,
}

/// Sets up the package manager, venv and dependencies for an install root.
pub struct RuntimeProvisioner {
    paths: AppPaths,
    python_version: String,
    release_base: String,
    runner: Arc<dyn ProcessRunner>,
}

impl RuntimeProvisioner {
    pub fn new(paths: AppPaths, settings: &Settings, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            paths,
            python_version: settings.python_version.clone(),
            release_base: UV_RELEASE_BASE.to_string(),
            runner,
        }
    }

    /// Download portable releases from another base URL.
    pub fn with_release_base(mut self, base: impl Into<String>) -> Self {
        self.release_base = base.into();
        self
    }

    /// Run all provisioning steps.
    pub fn provision(&self, ui: &mut dyn UserInterface) -> Result<ProvisionOutcome> {
        let env = self.ensure_package_manager(ui)?;
        self.create_venv(&env, ui)?;

        if !self.paths.pyproject().exists() {
            ui.warning("No pyproject.toml found, skipping dependency installation");
            return Ok(ProvisionOutcome::DependenciesSkipped {
                portable: env.is_portable,
            });
        }

        let Some(variant) = self.choose_variant(ui)? else {
            tracing::info!("Build variant selection cancelled");
            return Ok(ProvisionOutcome::Cancelled);
        };
        self.install_dependencies(&env, variant, ui)?;

        Ok(ProvisionOutcome::Provisioned {
            variant,
            portable: env.is_portable,
        })
    }

    /// Resolve the package manager, downloading the portable copy when no
    /// candidate works.
    pub fn ensure_package_manager(&self, ui: &mut dyn UserInterface) -> Result<ResolvedEnvironment> {
        let resolver = EnvironmentResolver::new(self.paths.install_root());
        match resolver.resolve(self.runner.as_ref()) {
            Ok(env) => return Ok(env),
            Err(McpError::EnvironmentNotFound { probes }) => {
                tracing::info!("No usable uv ({}), downloading portable copy", probes.join("; "));
            }
            Err(e) => return Err(e),
        }

        self.download_portable(ui)?;
        resolver.resolve(self.runner.as_ref())
    }

    fn portable_url(&self) -> String {
        format!(
            "{}/uv-{}{}",
            self.release_base.trim_end_matches('/'),
            target_triple(),
            native_archive_format().extension()
        )
    }

    fn download_portable(&self, ui: &mut dyn UserInterface) -> Result<()> {
        let url = self.portable_url();
        let format = native_archive_format();
        let dir = self.paths.portable_tool_dir();
        let archive = self
            .paths
            .install_root()
            .join(format!("uv-download{}", format.extension()));

        let mut spinner = ui.start_spinner("Downloading portable uv");
        remove_dir_if_present(&dir);
        fs::create_dir_all(&dir)?;

        let installed = Downloader::new()
            .and_then(|d| d.download(&url, &archive))
            .and_then(|_| extract_archive(self.runner.as_ref(), &archive, &dir, format))
            .and_then(|_| flatten_single_dir(&dir))
            .and_then(|_| {
                let exe = self.paths.portable_tool_executable();
                if !exe.is_file() {
                    return Err(McpError::Other(anyhow::anyhow!(
                        "{} did not contain {}",
                        url,
                        exe.display()
                    )));
                }
                make_executable(&exe).map_err(McpError::from)
            });
        remove_dir_if_present(&archive);

        match installed {
            Ok(()) => {
                spinner.finish_success("Portable uv installed");
                Ok(())
            }
            Err(e) => {
                spinner.finish_error("Portable uv download failed");
                remove_dir_if_present(&dir);
                Err(e)
            }
        }
    }

    /// Replace the managed venv with a fresh one on the pinned Python.
    pub fn create_venv(&self, env: &ResolvedEnvironment, ui: &mut dyn UserInterface) -> Result<()> {
        let venv = self.paths.venv_dir();
        if venv.exists() {
            tracing::info!("Removing existing virtual environment {}", venv.display());
            fs::remove_dir_all(&venv)?;
        }

        let mut spinner = ui.start_spinner(&format!(
            "Creating virtual environment (Python {})",
            self.python_version
        ));
        let invocation = env
            .tool_command(["venv"])
            .arg(venv.to_string_lossy())
            .args(["--python", self.python_version.as_str()]);
        let result = self.runner.run(
            &invocation,
            &CommandOptions::in_dir(self.paths.install_root()),
        )?;

        if result.success {
            spinner.finish_success("Virtual environment created");
            Ok(())
        } else {
            spinner.finish_error("Failed to create virtual environment");
            Err(McpError::DependencyInstallFailed {
                message: StructuredError::from_result("uv venv", &result).message,
            })
        }
    }

    /// Ask for CPU or GPU, then the CUDA version and a driver check.
    ///
    /// `None` when the user cancels any of the prompts.
    pub fn choose_variant(&self, ui: &mut dyn UserInterface) -> Result<Option<BuildVariant>> {
        let Some(kind) = choose(
            ui,
            "build_variant",
            "Which dependency build should be installed?",
            vec![
                PromptOption::new("CPU (works everywhere)", "cpu"),
                PromptOption::new("GPU (NVIDIA CUDA, faster embeddings)", "gpu"),
            ],
            Some("cpu"),
        )?
        else {
            return Ok(None);
        };
        if kind != "gpu" {
            return Ok(Some(BuildVariant::Cpu));
        }

        let Some(extra) = choose(
            ui,
            "cuda_version",
            "Which CUDA version does your driver support?",
            CudaVersion::ALL
                .iter()
                .map(|v| PromptOption::new(v.label(), v.extra()))
                .collect(),
            Some(CudaVersion::Cu129.extra()),
        )?
        else {
            return Ok(None);
        };
        let cuda = CudaVersion::from_extra(&extra).ok_or_else(|| {
            McpError::Other(anyhow::anyhow!("Unknown CUDA build '{}'", extra))
        })?;

        if self.has_nvidia_driver() {
            return Ok(Some(BuildVariant::Cuda(cuda)));
        }

        ui.warning("No NVIDIA driver detected (nvidia-smi reported no GPU)");
        let choice = choose(
            ui,
            "missing_driver",
            "Install the GPU build anyway?",
            vec![
                PromptOption::new("Use the CPU build instead", "cpu"),
                PromptOption::new("Install the GPU build anyway", "force"),
            ],
            Some("cpu"),
        )?;
        Ok(choice.map(|c| {
            if c == "force" {
                BuildVariant::Cuda(cuda)
            } else {
                BuildVariant::Cpu
            }
        }))
    }

    /// Whether `nvidia-smi` lists at least one GPU.
    pub fn has_nvidia_driver(&self) -> bool {
        let invocation = Invocation::new("nvidia-smi")
            .args(["--query-gpu=name", "--format=csv,noheader,nounits"]);
        match self.runner.run(&invocation, &CommandOptions::default()) {
            Ok(result) => result.success && !result.stdout.trim().is_empty(),
            Err(e) => {
                tracing::debug!("nvidia-smi unavailable: {}", e);
                false
            }
        }
    }

    /// `uv sync --extra <variant>` into the managed venv.
    pub fn install_dependencies(
        &self,
        env: &ResolvedEnvironment,
        variant: BuildVariant,
        ui: &mut dyn UserInterface,
    ) -> Result<()> {
        let mut spinner = ui.start_spinner(&format!("Installing dependencies ({})", variant));
        let invocation = env.tool_command(["sync", "--extra", variant.extra()]);
        let options = CommandOptions::in_dir(self.paths.install_root())
            .with_env("VIRTUAL_ENV", self.paths.venv_dir().to_string_lossy());
        let result = self.runner.run(&invocation, &options)?;

        if result.success {
            spinner.finish_success("Dependencies installed");
            Ok(())
        } else {
            spinner.finish_error("Dependency installation failed");
            Err(McpError::DependencyInstallFailed {
                message: StructuredError::from_result("uv sync", &result).message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{CommandResult, MockRunner};
    use crate::ui::MockUI;
    use tempfile::TempDir;

    fn setup(runner: MockRunner, with_pyproject: bool) -> (TempDir, RuntimeProvisioner, Arc<MockRunner>) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("server");
        fs::create_dir_all(&root).unwrap();
        if with_pyproject {
            fs::write(root.join("pyproject.toml"), "version = \"0.3.1\"\n").unwrap();
        }
        let runner = Arc::new(runner);
        let provisioner = RuntimeProvisioner::new(
            AppPaths::new(root, temp.path()),
            &Settings::default(),
            runner.clone(),
        );
        (temp, provisioner, runner)
    }

    fn global_uv() -> MockRunner {
        let mut runner = MockRunner::new();
        runner.on_ok("uv --version", "uv 0.5.0");
        runner.on_ok("uv venv", "");
        runner.on_ok("uv sync", "");
        runner
    }

    #[test]
    fn cpu_build_end_to_end() {
        let (_temp, provisioner, runner) = setup(global_uv(), true);
        let mut ui = MockUI::new();
        ui.set_prompt_response("build_variant", "cpu");

        let outcome = provisioner.provision(&mut ui).unwrap();

        assert_eq!(
            outcome,
            ProvisionOutcome::Provisioned {
                variant: BuildVariant::Cpu,
                portable: false
            }
        );
        assert!(runner.was_called("--python 3.11"));
        let sync = runner
            .calls()
            .into_iter()
            .find(|c| c.line.contains("uv sync"))
            .unwrap();
        assert_eq!(sync.line, "uv sync --extra cpu");
        assert_eq!(sync.env[0].0, "VIRTUAL_ENV");
        assert!(sync.env[0].1.ends_with("venv"));
        assert!(!runner.was_called("nvidia-smi"));
    }

    #[test]
    fn stale_venv_is_replaced() {
        let (temp, provisioner, _) = setup(global_uv(), false);
        let stale = temp.path().join("server").join("venv").join("stale.txt");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        let outcome = provisioner.provision(&mut MockUI::new()).unwrap();

        assert_eq!(outcome, ProvisionOutcome::DependenciesSkipped { portable: false });
        assert!(!stale.exists());
    }

    #[test]
    fn gpu_with_driver_uses_chosen_cuda() {
        let mut runner = global_uv();
        runner.on_ok("nvidia-smi", "NVIDIA GeForce RTX 4090\n");
        let (_temp, provisioner, runner) = setup(runner, true);
        let mut ui = MockUI::new();
        ui.set_prompt_response("build_variant", "gpu");
        ui.set_prompt_response("cuda_version", "gpu128");

        let outcome = provisioner.provision(&mut ui).unwrap();

        assert_eq!(
            outcome,
            ProvisionOutcome::Provisioned {
                variant: BuildVariant::Cuda(CudaVersion::Cu128),
                portable: false
            }
        );
        assert!(runner.was_called("uv sync --extra gpu128"));
        assert!(!ui.was_prompted("missing_driver"));
    }

    #[test]
    fn gpu_defaults_to_cuda_129() {
        let mut runner = global_uv();
        runner.on_ok("nvidia-smi", "NVIDIA A100\n");
        let (_temp, provisioner, _) = setup(runner, true);
        let mut ui = MockUI::new();
        ui.set_prompt_response("build_variant", "gpu");

        assert_eq!(
            provisioner.choose_variant(&mut ui).unwrap(),
            Some(BuildVariant::Cuda(CudaVersion::Cu129))
        );
    }

    #[test]
    fn missing_driver_offers_cpu_or_force() {
        let mut runner = global_uv();
        runner.on_ok("nvidia-smi", "   \n");
        let (_temp, provisioner, _) = setup(runner, true);

        let mut ui = MockUI::new();
        ui.set_prompt_response("build_variant", "gpu");
        assert_eq!(provisioner.choose_variant(&mut ui).unwrap(), Some(BuildVariant::Cpu));
        assert!(ui.has_warning("No NVIDIA driver"));

        let mut ui = MockUI::new();
        ui.set_prompt_response("build_variant", "gpu");
        ui.set_prompt_response("missing_driver", "force");
        assert_eq!(
            provisioner.choose_variant(&mut ui).unwrap(),
            Some(BuildVariant::Cuda(CudaVersion::Cu129))
        );
    }

    #[test]
    fn cancelling_cuda_choice_cancels() {
        let (_temp, provisioner, runner) = setup(global_uv(), true);
        let mut ui = MockUI::new();
        ui.set_prompt_response("build_variant", "gpu");
        ui.cancel_prompt("cuda_version");

        assert_eq!(provisioner.provision(&mut ui).unwrap(), ProvisionOutcome::Cancelled);
        assert!(!runner.was_called("uv sync"));
    }

    #[test]
    fn sync_failure_is_fatal() {
        let mut runner = global_uv();
        runner.on_fail("uv sync", 1, "error: Failed to download `torch==2.5.0`");
        let (_temp, provisioner, _) = setup(runner, true);
        let mut ui = MockUI::new();

        let err = provisioner.provision(&mut ui).unwrap_err();

        match err {
            McpError::DependencyInstallFailed { message } => assert!(message.contains("torch")),
            other => panic!("Expected DependencyInstallFailed, got {:?}", other),
        }
    }

    #[test]
    fn venv_failure_is_fatal() {
        let mut runner = global_uv();
        runner.on_fail("uv venv", 2, "No interpreter found for Python 3.11");
        let (_temp, provisioner, runner) = setup(runner, true);

        let err = provisioner.provision(&mut MockUI::new()).unwrap_err();

        assert!(matches!(err, McpError::DependencyInstallFailed { .. }));
        assert!(!runner.was_called("uv sync"));
    }

    #[cfg(unix)]
    #[test]
    fn downloads_portable_copy_when_global_is_missing() {
        use httpmock::prelude::*;

        let server = MockServer::start();
        let asset = format!("/download/uv-{}.tar.gz", target_triple());
        let mock = server.mock(|when, then| {
            when.method(GET).path(asset.as_str());
            then.status(200).body("tarball");
        });

        let mut runner = MockRunner::new();
        runner.on_fail("uv --version", 127, "uv: command not found");
        // Stand-in for tar: lay out the release the way the real archive does.
        runner.on_with("tar -xzf", |invocation, _| {
            let tokens = invocation.tokens();
            let dst = &tokens[tokens.iter().position(|t| t == "-C").unwrap() + 1];
            let inner = std::path::Path::new(dst).join("uv-x86_64-unknown-linux-gnu");
            fs::create_dir_all(&inner)?;
            fs::write(inner.join("uv"), "#!/bin/sh\n")?;
            fs::write(inner.join("uvx"), "#!/bin/sh\n")?;
            Ok(CommandResult::success("", ""))
        });
        runner.on_with("/uv/uv --version", |invocation, _| {
            if std::path::Path::new(&invocation.tokens()[0]).is_file() {
                Ok(CommandResult::success("uv 0.5.0", ""))
            } else {
                Ok(CommandResult::failure(Some(127), "", "No such file or directory"))
            }
        });
        let (temp, provisioner, _) = setup(runner, false);
        let provisioner = provisioner.with_release_base(server.url("/download"));
        let mut ui = MockUI::new();

        let env = provisioner.ensure_package_manager(&mut ui).unwrap();

        mock.assert();
        assert!(env.is_portable);
        let exe = temp.path().join("server").join("uv").join("uv");
        assert!(exe.is_file());
        assert!(!temp.path().join("server").join("uv-download.tar.gz").exists());
        {
            use std::os::unix::fs::PermissionsExt;
            assert_ne!(fs::metadata(&exe).unwrap().permissions().mode() & 0o111, 0);
        }
    }

    #[cfg(unix)]
    #[test]
    fn failed_portable_download_is_network_failure() {
        use httpmock::prelude::*;

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(404).body("Not Found");
        });
        let mut runner = MockRunner::new();
        runner.on_fail("uv --version", 127, "uv: command not found");
        let (temp, provisioner, _) = setup(runner, false);
        let provisioner = provisioner.with_release_base(server.url("/download"));

        let err = provisioner
            .ensure_package_manager(&mut MockUI::new())
            .unwrap_err();

        assert!(matches!(err, McpError::NetworkFailure { .. }));
        assert!(!temp.path().join("server").join("uv").exists());
    }

    #[test]
    fn variant_extras() {
        assert_eq!(BuildVariant::Cpu.extra(), "cpu");
        assert_eq!(BuildVariant::Cuda(CudaVersion::Cu126).extra(), "gpu126");
        assert_eq!(CudaVersion::from_extra("gpu129"), Some(CudaVersion::Cu129));
        assert_eq!(CudaVersion::from_extra("gpu999"), None);
        assert_eq!(BuildVariant::Cuda(CudaVersion::Cu128).to_string(), "GPU (gpu128)");
    }
}
