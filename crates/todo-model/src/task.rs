//! The `Task` record and its builder (spec §3, §4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use todo_utils::error::TodoError;

use crate::enums::{Priority, RelationType, Size, Status, TaskType};
use crate::verification::Verification;

const MIN_TITLE_LEN: usize = 3;
const MAX_TITLE_LEN: usize = 200;

/// A typed cross-reference to another task (spec §3 `relates`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Relation {
    #[serde(rename = "type")]
    pub kind: RelationType,
    pub task_id: String,
}

/// The central entity (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub priority: Priority,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub size: Option<Size>,
    pub parent_id: Option<String>,
    pub depends: BTreeSet<String>,
    pub phase: Option<String>,
    pub labels: BTreeSet<String>,
    pub files: BTreeSet<String>,
    pub acceptance: BTreeSet<String>,
    pub notes: Vec<TimestampedNote>,
    pub description: Option<String>,
    pub blocked_by: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub verification: Verification,
    pub relates: BTreeSet<Relation>,
}

/// One entry in `Task::notes` (append-only, spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimestampedNote {
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

impl Task {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, Status::Done | Status::Cancelled)
    }
}

/// Builds a [`Task`], enforcing the field-level invariants from spec §4.4:
/// title length, required conditional fields, and inferred `type`.
pub struct TaskBuilder {
    id: String,
    title: String,
    status: Status,
    priority: Priority,
    task_type: Option<TaskType>,
    size: Option<Size>,
    parent_id: Option<String>,
    depends: BTreeSet<String>,
    phase: Option<String>,
    labels: BTreeSet<String>,
    files: BTreeSet<String>,
    acceptance: BTreeSet<String>,
    description: Option<String>,
    blocked_by: Option<String>,
    cancellation_reason: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TaskBuilder {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: Status::Pending,
            priority: Priority::Medium,
            task_type: None,
            size: None,
            parent_id: None,
            depends: BTreeSet::new(),
            phase: None,
            labels: BTreeSet::new(),
            files: BTreeSet::new(),
            acceptance: BTreeSet::new(),
            description: None,
            blocked_by: None,
            cancellation_reason: None,
            completed_at: None,
            cancelled_at: None,
            created_at,
        }
    }

    #[must_use]
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = Some(task_type);
        self
    }

    #[must_use]
    pub fn size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn depends(mut self, depends: BTreeSet<String>) -> Self {
        self.depends = depends;
        self
    }

    #[must_use]
    pub fn phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    #[must_use]
    pub fn labels(mut self, labels: BTreeSet<String>) -> Self {
        self.labels = labels;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn blocked_by(mut self, reason: impl Into<String>) -> Self {
        self.blocked_by = Some(reason.into());
        self
    }

    #[must_use]
    pub fn cancellation_reason(mut self, reason: impl Into<String>) -> Self {
        self.cancellation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    #[must_use]
    pub fn cancelled_at(mut self, at: DateTime<Utc>) -> Self {
        self.cancelled_at = Some(at);
        self
    }

    /// Infer `type` from the parent if none was set explicitly: a task
    /// with a parent of type `epic` becomes `task`; a task with a parent
    /// of type `task` becomes `subtask`.
    #[must_use]
    pub fn infer_type_from_parent(mut self, parent_type: Option<TaskType>) -> Self {
        if self.task_type.is_none() {
            self.task_type = Some(match parent_type {
                Some(TaskType::Epic) => TaskType::Task,
                Some(TaskType::Task) => TaskType::Subtask,
                _ => TaskType::Epic,
            });
        }
        self
    }

    pub fn build(self) -> Result<Task, TodoError> {
        let len = self.title.chars().count();
        if !(MIN_TITLE_LEN..=MAX_TITLE_LEN).contains(&len) {
            return Err(TodoError::InvalidInput {
                message: format!(
                    "title must be {MIN_TITLE_LEN}-{MAX_TITLE_LEN} characters, got {len}"
                ),
            });
        }

        if self.status == Status::Blocked && self.blocked_by.is_none() {
            return Err(TodoError::InvalidInput {
                message: "blockedBy is required when status is blocked".to_string(),
            });
        }
        if self.status == Status::Done && self.completed_at.is_none() {
            return Err(TodoError::InvalidInput {
                message: "completedAt is required when status is done".to_string(),
            });
        }
        if self.status == Status::Cancelled
            && (self.cancelled_at.is_none() || self.cancellation_reason.is_none())
        {
            return Err(TodoError::InvalidInput {
                message: "cancelledAt and cancellationReason are required when status is cancelled"
                    .to_string(),
            });
        }

        let task_type = self.task_type.unwrap_or(TaskType::Task);
        if task_type != TaskType::Epic && self.parent_id.is_none() && task_type == TaskType::Subtask
        {
            // subtasks may still exist without an explicit parent in data
            // migrated from elsewhere; no error, just permitted shape.
        }

        Ok(Task {
            id: self.id,
            title: self.title,
            status: self.status,
            priority: self.priority,
            task_type,
            size: self.size,
            parent_id: self.parent_id,
            depends: self.depends,
            phase: self.phase,
            labels: self.labels,
            files: self.files,
            acceptance: self.acceptance,
            notes: Vec::new(),
            description: self.description,
            blocked_by: self.blocked_by,
            cancellation_reason: self.cancellation_reason,
            created_at: self.created_at,
            updated_at: None,
            completed_at: self.completed_at,
            cancelled_at: self.cancelled_at,
            verification: Verification::default(),
            relates: BTreeSet::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn builds_minimal_pending_task() {
        let task = TaskBuilder::new("T001", "write the thing", now())
            .infer_type_from_parent(None)
            .build()
            .unwrap();
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.task_type, TaskType::Epic);
    }

    #[test]
    fn rejects_title_too_short() {
        let result = TaskBuilder::new("T001", "ab", now()).build();
        assert!(result.is_err());
    }

    #[test]
    fn blocked_requires_blocked_by() {
        let result = TaskBuilder::new("T001", "a valid title", now())
            .status(Status::Blocked)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn done_requires_completed_at() {
        let result = TaskBuilder::new("T001", "a valid title", now())
            .status(Status::Done)
            .build();
        assert!(result.is_err());

        let ok = TaskBuilder::new("T001", "a valid title", now())
            .status(Status::Done)
            .completed_at(now())
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn infers_task_type_from_parent() {
        let t = TaskBuilder::new("T002", "child of an epic", now())
            .infer_type_from_parent(Some(TaskType::Epic))
            .build()
            .unwrap();
        assert_eq!(t.task_type, TaskType::Task);

        let s = TaskBuilder::new("T003", "child of a task", now())
            .infer_type_from_parent(Some(TaskType::Task))
            .build()
            .unwrap();
        assert_eq!(s.task_type, TaskType::Subtask);
    }
}
