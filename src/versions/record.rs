//! Version records as reported by `list --json`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Artifact flags of a version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionFlags {
    pub has_analysis: bool,
    #[serde(rename = "has_bm25s")]
    pub has_lexical_index: bool,
    #[serde(rename = "has_faiss")]
    pub has_vector_index: bool,
    #[serde(rename = "has_pagerank")]
    pub has_rank: bool,
    pub has_hybrid_search: bool,
    pub has_full_analysis: bool,
}

/// One imported dataset version. Read-only snapshot of the tool's state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    #[serde(rename = "version")]
    pub id: String,
    #[serde(default)]
    pub extract_path: Option<PathBuf>,
    #[serde(default)]
    pub index_path: Option<PathBuf>,
    #[serde(default)]
    pub analysis_path: Option<PathBuf>,
    #[serde(default, rename = "bm25s_path")]
    pub lexical_index_path: Option<PathBuf>,
    #[serde(default, rename = "faiss_path")]
    pub vector_index_path: Option<PathBuf>,
    #[serde(default, rename = "pagerank_path")]
    pub rank_path: Option<PathBuf>,
    #[serde(flatten)]
    pub flags: VersionFlags,
    /// Readiness as computed by the tool. Not authoritative, see
    /// [`VersionRecord::is_ready_derived`].
    #[serde(default)]
    pub is_ready: bool,
    #[serde(default)]
    pub file_count: u64,
    #[serde(
        default,
        rename = "created",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl VersionRecord {
    /// Readiness re-derived from the artifact flags: rank, lexical index
    /// and vector index must all be present.
    pub fn is_ready_derived(&self) -> bool {
        self.flags.has_rank && self.flags.has_lexical_index && self.flags.has_vector_index
    }

    /// Whether the tool's own `is_ready` disagrees with the flags.
    pub fn readiness_disagrees(&self) -> bool {
        self.is_ready != self.is_ready_derived()
    }

    /// One-line description used by version pickers.
    pub fn annotation(&self) -> String {
        format!(
            "{}, lexical {}, vector {}",
            if self.flags.has_analysis {
                "analyzed"
            } else {
                "not analyzed"
            },
            check(self.flags.has_lexical_index),
            check(self.flags.has_vector_index),
        )
    }
}

fn check(present: bool) -> &'static str {
    if present {
        "✓"
    } else {
        "✗"
    }
}

/// Parse the tool's timestamp: RFC 3339, or naive ISO 8601 taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Parse the output of `list --json`.
///
/// Anything printed before the JSON array (log lines, warnings from the
/// package manager) is skipped.
pub fn parse_version_list(stdout: &str) -> serde_json::Result<Vec<VersionRecord>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str(trimmed) {
        Ok(records) => Ok(records),
        Err(first_err) => match trimmed.find("\n[") {
            Some(idx) => serde_json::from_str(&trimmed[idx + 1..]),
            None => Err(first_err),
        },
    }
}
