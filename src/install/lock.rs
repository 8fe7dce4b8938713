//! Advisory lock serializing work on one install root.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use fs2::FileExt;

use crate::error::{McpError, Result};

/// Longer than any [`InstallLock::is_held`] check keeps its shared lock.
const CONTENDED_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Exclusive hold on an install root. Released on drop.
#[derive(Debug)]
pub struct InstallLock {
    file: File,
    path: PathBuf,
}

impl InstallLock {
    /// Take the lock without waiting.
    ///
    /// Fails with [`McpError::InstallInProgress`] when another holder exists,
    /// in this process or any other. A contended lock is retried once after
    /// a short delay, so a concurrent [`InstallLock::is_held`] check is not
    /// mistaken for an install.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = open_lock_file(path)?;
        let locked = match file.try_lock_exclusive() {
            Err(e) if is_contended(&e) => {
                tracing::debug!("Install lock {} contended, retrying once", path.display());
                thread::sleep(CONTENDED_RETRY_DELAY);
                file.try_lock_exclusive()
            }
            other => other,
        };
        match locked {
            Ok(()) => {
                tracing::debug!("Acquired install lock {}", path.display());
                Ok(Self {
                    file,
                    path: path.to_path_buf(),
                })
            }
            Err(e) if is_contended(&e) => Err(McpError::InstallInProgress {
                lock: path.to_path_buf(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether someone currently holds the lock at `path`.
    ///
    /// Checks with a shared lock, which never conflicts with other checks.
    pub fn is_held(path: &Path) -> bool {
        if !path.exists() {
            return false;
        }
        let Ok(file) = open_lock_file(path) else {
            return false;
        };
        match FileExt::try_lock_shared(&file) {
            Ok(()) => {
                let _ = FileExt::unlock(&file);
                false
            }
            Err(e) => is_contended(&e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to release install lock {}: {}", self.path.display(), e);
        } else {
            tracing::debug!("Released install lock {}", self.path.display());
        }
    }
}

fn open_lock_file(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
