//! todo-engine: local, file-backed task-management core, wired together
//! behind a thin CLI (spec §1: the CLI surface is intentionally minimal;
//! all domain logic lives in the `todo-*` crates).

pub mod cli;

/// Returns the crate version.
#[must_use]
pub fn todo_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
