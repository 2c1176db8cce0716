//! The current-work pointer (spec §3, §4.8).

use serde::{Deserialize, Serialize};

/// `{ currentTask, currentPhase, sessionNote, nextAction }`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Focus {
    pub current_task: Option<String>,
    pub current_phase: Option<String>,
    pub session_note: Option<String>,
    pub next_action: Option<String>,
}

impl Focus {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current_task.is_none()
            && self.current_phase.is_none()
            && self.session_note.is_none()
            && self.next_action.is_none()
    }
}
