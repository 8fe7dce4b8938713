//! Process execution: buffered calls, long-lived processes and the runner seam.

pub mod command;
pub mod mock;
pub mod platform;
pub mod process;
pub mod runner;

pub use command::{execute, execute_check, CommandOptions, CommandResult, Invocation};
pub use mock::{MockRunner, RecordedCall};
pub use platform::{is_ci, make_executable, native_archive_format, target_triple, ArchiveFormat};
pub use process::ProcessHandle;
pub use runner::{ProcessRunner, SystemRunner};
