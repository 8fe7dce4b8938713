//! On-disk index discovery under the data root.

use std::fs;
use std::path::Path;

/// Directory name under `indexes/` that is not a version.
pub const RESERVED_INDEX_DIR: &str = "latest";

/// Version identifiers with a non-empty index directory, sorted.
///
/// A missing `indexes/` directory yields an empty list.
pub fn discover_index_versions(indexes_dir: &Path) -> std::io::Result<Vec<String>> {
    let entries = match fs::read_dir(indexes_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut versions = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == RESERVED_INDEX_DIR {
            continue;
        }
        if fs::read_dir(entry.path())?.next().is_some() {
            versions.push(name);
        }
    }
    versions.sort();
    Ok(versions)
}
