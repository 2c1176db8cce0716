//! Hierarchy, dependency graph, and analysis algorithms (spec §4.5, §4.10).
//!
//! Everything here is read-only: it borrows an active task slice and
//! derives views over it. Mutation lives in `todo-mutate`.

pub mod analysis;
pub mod hierarchy;

pub use analysis::{Domain, EpicPlan, Tier, Weights};
pub use hierarchy::{MAX_DEPTH, MAX_SIBLINGS, TaskGraph};
