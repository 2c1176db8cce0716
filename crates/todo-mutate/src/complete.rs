//! `complete` (spec §4.7).

use chrono::Utc;
use todo_model::{Status, TimestampedNote};
use todo_utils::error::TodoError;

use crate::handle::{StoreHandle, audit_entry};

#[derive(Debug, Clone, Default)]
pub struct CompleteOptions {
    pub notes: Option<String>,
    pub skip_notes: bool,
}

/// Transition `pending|active|blocked → done`.
pub fn complete(handle: &StoreHandle, id: &str, opts: CompleteOptions) -> Result<(), TodoError> {
    if opts.notes.is_none() && !opts.skip_notes {
        return Err(TodoError::InvalidInput {
            message: "notes are required to complete a task unless skip_notes is set".to_string(),
        });
    }

    handle.mutate_active(|active, _archive| {
        let task = active.find_mut(id).ok_or_else(|| TodoError::TaskNotFound { id: id.to_string() })?;
        if task.is_terminal() {
            return Err(TodoError::InvalidStatusTransition {
                id: id.to_string(),
                from: task.status.to_string(),
                to: Status::Done.to_string(),
            });
        }

        let now = Utc::now();
        task.status = Status::Done;
        task.completed_at = Some(now);
        task.blocked_by = None;
        task.updated_at = Some(now);
        if let Some(text) = opts.notes {
            task.notes.push(TimestampedNote { timestamp: now, text });
        }

        if active.focus.current_task.as_deref() == Some(id) {
            active.focus.current_task = None;
        }

        Ok(())
    })?;

    handle.append_audit(audit_entry("task.complete", Some(id.to_string())))
}
