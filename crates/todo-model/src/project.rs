//! Project-level state: the phase map and its history (spec §3).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::phase::{Phase, PhaseHistoryEntry};

/// `{ name, currentPhase, phases, phaseHistory }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectState {
    pub name: String,
    pub current_phase: Option<String>,
    pub phases: BTreeMap<String, Phase>,
    pub phase_history: Vec<PhaseHistoryEntry>,
}

impl ProjectState {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current_phase: None,
            phases: BTreeMap::new(),
            phase_history: Vec::new(),
        }
    }
}
