//! Shared primitives for the todo-engine workspace: project paths, the
//! error taxonomy, exit codes, and tracing setup.
//!
//! Every other crate in the workspace depends on this one; it must not
//! depend back on any of them.

pub mod error;
pub mod exit_codes;
pub mod ids;
pub mod logging;
pub mod paths;

pub use error::TodoError;
pub use exit_codes::ExitCode;
