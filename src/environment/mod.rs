//! Locating the package/runtime manager.
//!
//! A globally installed `uv` on `PATH` always wins. When it is missing or
//! broken, the portable copy under the install root is used instead. No
//! result is cached: every top-level operation resolves again, because an
//! install step may have just put a tool in place (or the user removed one).

pub mod resolver;

pub use resolver::{CandidateKind, EnvironmentCandidate, EnvironmentResolver, ResolvedEnvironment};
