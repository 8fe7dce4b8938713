//! Installation, update and runtime provisioning.
//!
//! [`InstallOrchestrator`] acquires the server source through an ordered
//! list of [`AcquisitionStrategy`] implementations (git clone, then archive
//! download), moves it into place from a staging directory, and provisions
//! the Python runtime with [`RuntimeProvisioner`]. All of it runs under an
//! [`InstallLock`].

pub mod download;
pub mod lock;
pub mod orchestrator;
pub mod runtime;
pub mod strategy;
pub mod version;

pub use download::{archive_format_for, extract_archive, flatten_single_dir, Downloader};
pub use lock::InstallLock;
pub use orchestrator::{InstallOrchestrator, InstallOutcome, ReconcileOffer};
pub use runtime::{BuildVariant, CudaVersion, ProvisionOutcome, RuntimeProvisioner, UV_RELEASE_BASE};
pub use strategy::{
    acquire_into_root, clean_stale_staging, default_strategies, AcquisitionStrategy,
    ArchiveStrategy, GitStrategy,
};
pub use version::{current_version, latest_version};
