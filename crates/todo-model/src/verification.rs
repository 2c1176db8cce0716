//! Per-task verification gate map (spec §4.11).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Known gate names. The required set defaults to every variant except
/// `CleanupDone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum GateName {
    Implemented,
    TestsPassed,
    QaPassed,
    CleanupDone,
    SecurityPassed,
    Documented,
}

impl GateName {
    /// The default required gate set (spec §4.11).
    #[must_use]
    pub fn default_required() -> &'static [GateName] {
        &[
            GateName::Implemented,
            GateName::TestsPassed,
            GateName::QaPassed,
            GateName::SecurityPassed,
            GateName::Documented,
        ]
    }

    #[must_use]
    pub fn all() -> &'static [GateName] {
        &[
            GateName::Implemented,
            GateName::TestsPassed,
            GateName::QaPassed,
            GateName::CleanupDone,
            GateName::SecurityPassed,
            GateName::Documented,
        ]
    }
}

/// One entry in a gate's failure history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureLogEntry {
    pub round: u32,
    pub agent: Option<String>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// `verification` sub-record on a `Task` (spec §3, §4.11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    pub passed: bool,
    pub round: u32,
    pub gates: BTreeMap<GateName, bool>,
    pub last_agent: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub failure_log: Vec<FailureLogEntry>,
}

impl Default for Verification {
    fn default() -> Self {
        let gates = GateName::all().iter().map(|g| (*g, false)).collect();
        Self {
            passed: false,
            round: 0,
            gates,
            last_agent: None,
            last_updated: None,
            failure_log: Vec::new(),
        }
    }
}

impl Verification {
    /// Recompute `passed` as the AND over the required gate set.
    pub fn recompute_passed(&mut self, required: &[GateName]) {
        self.passed = required.iter().all(|g| self.gates.get(g).copied().unwrap_or(false));
    }
}
