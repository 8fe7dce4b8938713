//! HTTP downloads and archive extraction.
//!
//! Extraction shells out to `tar`, `unzip` or PowerShell through the
//! [`ProcessRunner`], so no archive crates are needed.

use std::fs::{self, File};
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use reqwest::blocking::Client;

use crate::error::{McpError, Result};
use crate::shell::{ArchiveFormat, CommandOptions, Invocation, ProcessRunner};

/// Blocking HTTP downloader.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    /// Create a downloader with a ten minute timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(600))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ifs-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| McpError::NetworkFailure {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// Stream `url` into `dest`, returning the byte count.
    ///
    /// Transport errors and non-success statuses are
    /// [`McpError::NetworkFailure`]. A partial file is removed.
    pub fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        tracing::debug!("Downloading {} to {}", url, dest.display());
        let network = |e: reqwest::Error| McpError::NetworkFailure {
            message: format!("{}: {}", url, e),
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(network)?;

        let mut file = File::create(dest)?;
        match response.copy_to(&mut file) {
            Ok(bytes) => {
                tracing::debug!("Downloaded {} bytes from {}", bytes, url);
                Ok(bytes)
            }
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(dest);
                Err(network(e))
            }
        }
    }
}

/// Archive format implied by a download URL.
pub fn archive_format_for(url: &str) -> ArchiveFormat {
    if url.to_lowercase().ends_with(".zip") {
        ArchiveFormat::Zip
    } else {
        ArchiveFormat::TarGz
    }
}

/// Unpack `archive` into the existing directory `dst`.
pub fn extract_archive(
    runner: &dyn ProcessRunner,
    archive: &Path,
    dst: &Path,
    format: ArchiveFormat,
) -> Result<()> {
    let attempts = match format {
        ArchiveFormat::TarGz => vec![tar_invocation(archive, dst, "-xzf")],
        ArchiveFormat::Zip => zip_invocations(archive, dst),
    };
    run_first_success(runner, &attempts)
        .with_context(|| format!("Failed to extract {}", archive.display()))?;
    Ok(())
}

fn tar_invocation(archive: &Path, dst: &Path, flags: &str) -> Invocation {
    Invocation::new("tar")
        .arg(flags)
        .arg(archive.to_string_lossy())
        .arg("-C")
        .arg(dst.to_string_lossy())
}

fn zip_invocations(archive: &Path, dst: &Path) -> Vec<Invocation> {
    let mut attempts = Vec::new();
    if cfg!(windows) {
        attempts.push(Invocation::new("powershell").args([
            "-NoProfile".to_string(),
            "-Command".to_string(),
            format!(
                "Expand-Archive -LiteralPath '{}' -DestinationPath '{}' -Force",
                escape_ps_single_quote(archive),
                escape_ps_single_quote(dst)
            ),
        ]));
    }
    attempts.push(
        Invocation::new("unzip")
            .arg("-q")
            .arg(archive.to_string_lossy())
            .arg("-d")
            .arg(dst.to_string_lossy()),
    );
    // bsdtar reads zip archives too.
    attempts.push(tar_invocation(archive, dst, "-xf"));
    attempts
}

fn escape_ps_single_quote(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "''")
}

fn run_first_success(runner: &dyn ProcessRunner, attempts: &[Invocation]) -> anyhow::Result<()> {
    let mut failures = Vec::new();
    for invocation in attempts {
        match runner.run(invocation, &CommandOptions::default()) {
            Ok(result) if result.success => return Ok(()),
            Ok(result) => failures.push(format!("{}: {}", invocation, result.stderr.trim())),
            Err(e) => failures.push(format!("{}: {}", invocation, e)),
        }
    }
    bail!("{}", failures.join("; "))
}

/// Hoist the contents of a lone top-level directory into `dir`.
///
/// Source archives unpack into a `<name>-<branch>/` folder and release
/// archives into `<name>-<target>/`; both should land directly in `dir`.
/// Anything else is left untouched.
pub fn flatten_single_dir(dir: &Path) -> Result<()> {
    let entries: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    let [only] = entries.as_slice() else {
        return Ok(());
    };
    if !only.file_type()?.is_dir() {
        return Ok(());
    }

    // Renamed first so a child with the same name as the wrapper can move up.
    let wrapper = dir.join(".ifs-mcp-flatten");
    fs::rename(only.path(), &wrapper)?;
    for child in fs::read_dir(&wrapper)? {
        let child = child?;
        fs::rename(child.path(), dir.join(child.file_name()))?;
    }
    fs::remove_dir(&wrapper)?;
    Ok(())
}
