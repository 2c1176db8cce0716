//! Session scoping and focus management (spec §4.8): which subset of the
//! task tree a session claims, and the single current-task pointer within
//! it.

pub mod focus;
pub mod lifecycle;
pub mod scope;
pub mod sessions_store;
mod txn;

pub use lifecycle::{FocusChoice, StartOptions, close, end, list, resume, show, start, status, suspend, switch};
pub use sessions_store::SessionsFile;
