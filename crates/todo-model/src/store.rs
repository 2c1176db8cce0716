//! Store-level wrappers: the archive store and per-file metadata (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::focus::Focus;
use crate::project::ProjectState;
use crate::task::Task;

/// Current on-disk schema version. Bumped whenever a field is added or
/// renamed in a way that changes the wire format.
pub const SCHEMA_VERSION: u32 = 1;

/// Per-file metadata embedded in every persisted store (spec §3
/// `_meta`). `checksum` is a short hex digest of the `tasks` array
/// content, used by the validator's checksum check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub schema_version: u32,
    pub checksum: String,
    pub last_modified: DateTime<Utc>,
    pub active_session: Option<String>,
}

impl StoreMeta {
    #[must_use]
    pub fn new(checksum: String, last_modified: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            checksum,
            last_modified,
            active_session: None,
        }
    }
}

/// A task once it has moved to the archive store, with the fields that
/// only exist post-archival (spec §3 "Archive-only fields").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedTask {
    #[serde(flatten)]
    pub task: Task,
    pub archived_at: DateTime<Utc>,
    pub archive_reason: String,
    pub cycle_time_days: Option<i64>,
    pub session_id: Option<String>,
}

/// `{ archivedTasks: [Task...] }`, a separate file sharing the active
/// store's id namespace.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArchiveStore {
    pub archived_tasks: Vec<ArchivedTask>,
}

/// `todo.json`: active tasks, the phase map, focus, and store metadata
/// (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveStore {
    pub tasks: Vec<Task>,
    pub project: ProjectState,
    pub focus: Focus,
    #[serde(rename = "_meta")]
    pub meta: StoreMeta,
}

impl ActiveStore {
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

impl ArchiveStore {
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ArchivedTask> {
        self.archived_tasks.iter().find(|t| t.task.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }
}
