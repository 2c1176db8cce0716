//! Project phases and their append-only history (spec §3, §4.9).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Phase lifecycle status: `pending → active → completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PhaseStatus {
    Pending,
    Active,
    Completed,
}

/// Kind of phase-history transition recorded (spec §3 `phaseHistory`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum PhaseTransitionType {
    Started,
    Completed,
    Renamed,
    RolledBack,
    /// A `phase set` jump to a phase whose `order` is at or ahead of the
    /// current one (spec §4.9) — anything that isn't a rollback.
    Set,
}

/// `{ name, description, order, status, startedAt?, completedAt? }`
/// keyed externally by a slug matching `^[a-z][a-z0-9-]*$`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub description: Option<String>,
    pub order: u32,
    pub status: PhaseStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Phase {
    #[must_use]
    pub fn new(name: impl Into<String>, order: u32) -> Self {
        Self {
            name: name.into(),
            description: None,
            order,
            status: PhaseStatus::Pending,
            started_at: None,
            completed_at: None,
        }
    }
}

/// One append-only entry in `projectState.phaseHistory`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseHistoryEntry {
    pub phase: String,
    pub transition_type: PhaseTransitionType,
    pub timestamp: DateTime<Utc>,
    pub task_count: usize,
    pub from_phase: Option<String>,
    pub reason: Option<String>,
}

/// Matches the slug form required of every phase key (spec §3).
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    let mut chars = slug.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_validation() {
        assert!(is_valid_slug("design"));
        assert!(is_valid_slug("phase-2"));
        assert!(!is_valid_slug("Design"));
        assert!(!is_valid_slug("2-phase"));
        assert!(!is_valid_slug(""));
    }
}
