//! Imported dataset versions and their readiness.
//!
//! Records come from the tool's `list --json` and are never modified here.
//! Readiness is always re-derived from the artifact flags: a version is
//! ready when it has a rank, a lexical index and a vector index.

pub mod discovery;
pub mod readiness;
pub mod record;

pub use discovery::{discover_index_versions, RESERVED_INDEX_DIR};
pub use readiness::{derive_status, readiness_disagreements, ready_versions, Status};
pub use record::{parse_timestamp, parse_version_list, VersionFlags, VersionRecord};
