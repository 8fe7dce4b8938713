//! Current and latest version identifiers for reconcile.
//!
//! Both lookups are best effort: `None` means "unresolvable", which makes
//! reconcile offer a reinstall instead of an update.

use std::fs;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::AppPaths;
use crate::shell::{CommandOptions, Invocation, ProcessRunner};

static PYPROJECT_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*version\s*=\s*"([^"]+)""#).unwrap());

const SHORT_SHA_LEN: usize = 7;

/// Version of the installed copy.
///
/// A git checkout reports HEAD cut to the same length as
/// [`latest_version`]; an archive install falls back to the `version` key of
/// `pyproject.toml`.
pub fn current_version(paths: &AppPaths, runner: &dyn ProcessRunner) -> Option<String> {
    if paths.git_dir().exists() {
        let invocation = Invocation::new("git").args(["rev-parse", "HEAD"]);
        match runner.run(&invocation, &CommandOptions::in_dir(paths.install_root())) {
            Ok(result) if result.success => {
                if let Some(sha) = short_sha(&result.stdout) {
                    return Some(sha);
                }
            }
            Ok(result) => tracing::debug!("git rev-parse failed: {}", result.stderr.trim()),
            Err(e) => tracing::debug!("git rev-parse failed: {}", e),
        }
    }

    let content = fs::read_to_string(paths.pyproject()).ok()?;
    pyproject_version(&content)
}

/// Head of the remote repository, shortened like [`current_version`].
pub fn latest_version(runner: &dyn ProcessRunner, repository_url: &str) -> Option<String> {
    let invocation = Invocation::new("git").args(["ls-remote", repository_url, "HEAD"]);
    let result = match runner.run(&invocation, &CommandOptions::default()) {
        Ok(r) if r.success => r,
        Ok(r) => {
            tracing::debug!("git ls-remote failed: {}", r.stderr.trim());
            return None;
        }
        Err(e) => {
            tracing::debug!("git ls-remote failed: {}", e);
            return None;
        }
    };

    result
        .stdout
        .lines()
        .next()
        .and_then(short_sha)
}

/// First whitespace-separated token, cut to [`SHORT_SHA_LEN`].
fn short_sha(text: &str) -> Option<String> {
    text.split_whitespace()
        .next()
        .map(|sha| sha.chars().take(SHORT_SHA_LEN).collect())
}

fn pyproject_version(content: &str) -> Option<String> {
    PYPROJECT_VERSION
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
