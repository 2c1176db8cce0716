//! Cross-entity invariant checking and repair (spec §4.6).
//!
//! `run` produces a read-only report against an in-memory snapshot.
//! `fix` and `fix_duplicates` apply the deterministic, non-interactive
//! repairs described in spec §4.6; an interactive front end may instead
//! present the same findings and call narrower mutators directly.

mod checks;
mod repair;

pub use checks::{CheckOutcome, CheckReport, Severity, run};
pub use repair::{FixOutcome, fix, fix_duplicates};
