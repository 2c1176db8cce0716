//! Multi-session scoping (spec §3, §4.8).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::focus::Focus;

/// `active → suspended → ended → closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Suspended,
    Ended,
    Closed,
}

/// The kind of root a session's scope is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ScopeType {
    Epic,
    Subtree,
    TaskGroup,
    Task,
    EpicPhase,
}

/// `{ type, rootTaskId, phase? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionScope {
    #[serde(rename = "type")]
    pub scope_type: ScopeType,
    pub root_task_id: String,
    pub phase: Option<String>,
}

/// `{ id, status, scope, focus, agent?, name?, startedAt, endedAt? }`.
/// `id` has the canonical form `session_YYYYMMDD_HHMMSS_<6hex>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub status: SessionStatus,
    pub scope: SessionScope,
    pub focus: Focus,
    pub agent: Option<String>,
    pub name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.status, SessionStatus::Active | SessionStatus::Suspended)
    }
}

/// Build the canonical session id for a given instant and a source of
/// distinguishing entropy (the caller supplies the hex suffix so this
/// module never calls `rand`/`SystemTime` itself, keeping it pure).
#[must_use]
pub fn format_session_id(at: DateTime<Utc>, suffix_hex: &str) -> String {
    format!("session_{}_{suffix_hex}", at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_canonical_session_id() {
        let at = DateTime::parse_from_rfc3339("2026-03-05T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_session_id(at, "a1b2c3"), "session_20260305_093000_a1b2c3");
    }

    #[test]
    fn open_statuses() {
        let scope = SessionScope {
            scope_type: ScopeType::Task,
            root_task_id: "T001".to_string(),
            phase: None,
        };
        let mut session = Session {
            id: "session_x".to_string(),
            status: SessionStatus::Active,
            scope,
            focus: Focus::default(),
            agent: None,
            name: None,
            started_at: Utc::now(),
            ended_at: None,
        };
        assert!(session.is_open());
        session.status = SessionStatus::Ended;
        assert!(!session.is_open());
    }
}
