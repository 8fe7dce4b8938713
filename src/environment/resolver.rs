//! Environment resolution.
//!
//! Resolves the package manager invocation using the candidate chain:
//! 1. Global `uv` on `PATH` (priority 0)
//! 2. Portable `uv` under `<install_root>/uv/` (priority 1)

use std::path::{Path, PathBuf};

use crate::config::paths::tool_executable_name;
use crate::error::{McpError, Result};
use crate::shell::{Invocation, ProcessRunner};

/// Where a candidate comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// Found on `PATH`.
    Global,
    /// Downloaded into the install root.
    Portable,
}

impl std::fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Portable => write!(f, "portable"),
        }
    }
}

/// One way of invoking the package manager, with the probe that proves it works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentCandidate {
    /// Tokens prepended to every call.
    pub invocation: Invocation,
    /// Command that must exit 0 for this candidate to be usable.
    pub probe: Invocation,
    /// Lower is preferred.
    pub priority: u8,
    /// Origin of the candidate.
    pub kind: CandidateKind,
}

impl EnvironmentCandidate {
    /// The `uv` found on `PATH`.
    pub fn global() -> Self {
        let invocation = Invocation::new("uv");
        Self {
            probe: invocation.clone().arg("--version"),
            invocation,
            priority: 0,
            kind: CandidateKind::Global,
        }
    }

    /// The portable copy for an install root.
    pub fn portable(install_root: &Path) -> Self {
        let exe = install_root.join("uv").join(tool_executable_name());
        let invocation = Invocation::new(exe.to_string_lossy().into_owned());
        Self {
            probe: invocation.clone().arg("--version"),
            invocation,
            priority: 1,
            kind: CandidateKind::Portable,
        }
    }
}

/// A working package manager invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnvironment {
    /// Tokens prepended to every call.
    pub invocation: Invocation,
    /// Whether the portable copy was chosen.
    pub is_portable: bool,
    /// Install root the resolution was made for.
    pub install_root: PathBuf,
}

impl ResolvedEnvironment {
    /// `<uv> <args…>`
    pub fn tool_command<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.invocation.clone().args(args)
    }
}

/// Probes candidates in priority order.
#[derive(Debug, Clone)]
pub struct EnvironmentResolver {
    install_root: PathBuf,
}

impl EnvironmentResolver {
    /// Create a resolver for an install root.
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
        }
    }

    /// Candidates sorted by priority.
    pub fn candidates(&self) -> Vec<EnvironmentCandidate> {
        let mut candidates = vec![
            EnvironmentCandidate::global(),
            EnvironmentCandidate::portable(&self.install_root),
        ];
        candidates.sort_by_key(|c| c.priority);
        candidates
    }

    /// Resolve a usable environment, probing fresh on every call.
    ///
    /// # Example
    ///
    /// ```
    /// use ifs_mcp::environment::EnvironmentResolver;
    /// use ifs_mcp::shell::MockRunner;
    ///
    /// let mut runner = MockRunner::new();
    /// runner.on_ok("uv --version", "uv 0.5.0");
    ///
    /// let resolved = EnvironmentResolver::new("/opt/ifs/server").resolve(&runner).unwrap();
    /// assert!(!resolved.is_portable);
    /// assert_eq!(resolved.invocation.program, "uv");
    /// ```
    pub fn resolve(&self, runner: &dyn ProcessRunner) -> Result<ResolvedEnvironment> {
        let mut attempted = Vec::new();

        for candidate in self.candidates() {
            let probe = candidate.probe.to_string();
            if runner.probe(&candidate.probe) {
                tracing::debug!("Using {} package manager: {}", candidate.kind, probe);
                return Ok(ResolvedEnvironment {
                    invocation: candidate.invocation,
                    is_portable: candidate.kind == CandidateKind::Portable,
                    install_root: self.install_root.clone(),
                });
            }
            tracing::debug!("Probe failed: {}", probe);
            attempted.push(probe);
        }

        Err(McpError::EnvironmentNotFound { probes: attempted })
    }
}
