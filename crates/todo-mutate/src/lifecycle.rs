//! `reopen`, `cancel`, `uncancel`, `promote` (spec §4.7).

use chrono::Utc;
use todo_model::{Status, TaskType};
use todo_utils::error::TodoError;

use crate::handle::{StoreHandle, audit_entry};

/// Only from `done`; clears `completedAt`; obeys the single-active cap
/// when `target == Active`.
pub fn reopen(handle: &StoreHandle, id: &str, target: Status, max_active_tasks: u32) -> Result<(), TodoError> {
    if !matches!(target, Status::Pending | Status::Active) {
        return Err(TodoError::InvalidInput {
            message: "reopen target must be pending or active".to_string(),
        });
    }

    handle.mutate_active(|active, _archive| {
        if target == Status::Active {
            let count = active.tasks.iter().filter(|t| t.status == Status::Active).count();
            if count >= max_active_tasks as usize {
                return Err(TodoError::SingleActiveViolation { max: max_active_tasks, current: count as u32 });
            }
        }
        let task = active.find_mut(id).ok_or_else(|| TodoError::TaskNotFound { id: id.to_string() })?;
        if task.status != Status::Done {
            return Err(TodoError::InvalidStatusTransition {
                id: id.to_string(),
                from: task.status.to_string(),
                to: target.to_string(),
            });
        }
        task.status = target;
        task.completed_at = None;
        task.updated_at = Some(Utc::now());
        task.notes.push(todo_model::TimestampedNote {
            timestamp: Utc::now(),
            text: format!("reopened to {target}"),
        });
        Ok(())
    })?;

    handle.append_audit(audit_entry("task.reopen", Some(id.to_string())))
}

/// Permitted from any non-terminal status. With `cascade`, applies the
/// same reason template to every descendant.
pub fn cancel(handle: &StoreHandle, id: &str, reason: &str, cascade: bool) -> Result<(), TodoError> {
    handle.mutate_active(|active, _archive| {
        let targets = if cascade {
            let graph = todo_graph::TaskGraph::new(&active.tasks);
            let mut ids: Vec<String> = vec![id.to_string()];
            ids.extend(graph.descendants(id).iter().map(|t| t.id.clone()));
            ids
        } else {
            vec![id.to_string()]
        };

        for target_id in &targets {
            let task = active
                .find_mut(target_id)
                .ok_or_else(|| TodoError::TaskNotFound { id: target_id.clone() })?;
            if task.is_terminal() {
                if *target_id == id {
                    return Err(TodoError::InvalidStatusTransition {
                        id: target_id.clone(),
                        from: task.status.to_string(),
                        to: Status::Cancelled.to_string(),
                    });
                }
                continue;
            }
            let now = Utc::now();
            task.status = Status::Cancelled;
            task.cancelled_at = Some(now);
            task.cancellation_reason = Some(reason.to_string());
            task.updated_at = Some(now);
        }
        Ok(())
    })?;

    handle.append_audit(audit_entry("task.cancel", Some(id.to_string())))
}

/// Only from `cancelled`; restores to `pending`. With `cascade`, restores
/// every cancelled descendant too.
pub fn uncancel(handle: &StoreHandle, id: &str, cascade: bool) -> Result<(), TodoError> {
    handle.mutate_active(|active, _archive| {
        let targets = if cascade {
            let graph = todo_graph::TaskGraph::new(&active.tasks);
            let mut ids: Vec<String> = vec![id.to_string()];
            ids.extend(graph.descendants(id).iter().map(|t| t.id.clone()));
            ids
        } else {
            vec![id.to_string()]
        };

        for target_id in &targets {
            let task = active
                .find_mut(target_id)
                .ok_or_else(|| TodoError::TaskNotFound { id: target_id.clone() })?;
            if task.status != Status::Cancelled {
                if *target_id == id {
                    return Err(TodoError::InvalidStatusTransition {
                        id: target_id.clone(),
                        from: task.status.to_string(),
                        to: Status::Pending.to_string(),
                    });
                }
                continue;
            }
            task.status = Status::Pending;
            task.cancelled_at = None;
            task.cancellation_reason = None;
            task.updated_at = Some(Utc::now());
        }
        Ok(())
    })?;

    handle.append_audit(audit_entry("task.uncancel", Some(id.to_string())))
}

/// Clears `parentId`; optionally re-types `subtask → task`.
pub fn promote(handle: &StoreHandle, id: &str, retype_to_task: bool) -> Result<(), TodoError> {
    handle.mutate_active(|active, _archive| {
        let task = active.find_mut(id).ok_or_else(|| TodoError::TaskNotFound { id: id.to_string() })?;
        task.parent_id = None;
        if retype_to_task && task.task_type == TaskType::Subtask {
            task.task_type = TaskType::Task;
        }
        task.updated_at = Some(Utc::now());
        Ok(())
    })?;

    handle.append_audit(audit_entry("task.promote", Some(id.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::add::{AddOptions, add};
    use crate::complete::{CompleteOptions, complete};
    use todo_utils::paths::StorePaths;

    fn handle() -> (tempfile::TempDir, StoreHandle) {
        let td = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join(".todo")).unwrap();
        (td, StoreHandle::new(StorePaths::new(root)))
    }

    #[test]
    fn reopen_only_from_done() {
        let (_td, handle) = handle();
        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        let id = add(&handle, "a task to reopen", opts).unwrap().id;
        assert!(reopen(&handle, &id, Status::Pending, 1).is_err());
        complete(&handle, &id, CompleteOptions { skip_notes: true, ..Default::default() }).unwrap();
        assert!(reopen(&handle, &id, Status::Pending, 1).is_ok());
    }

    #[test]
    fn cancel_then_uncancel_round_trips() {
        let (_td, handle) = handle();
        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        let id = add(&handle, "a task to cancel", opts).unwrap().id;
        cancel(&handle, &id, "no longer needed", false).unwrap();
        let active = handle.read_active().unwrap();
        assert_eq!(active.find(&id).unwrap().status, Status::Cancelled);

        uncancel(&handle, &id, false).unwrap();
        let active = handle.read_active().unwrap();
        assert_eq!(active.find(&id).unwrap().status, Status::Pending);
    }

    #[test]
    fn cancel_rejects_an_already_terminal_primary_target() {
        let (_td, handle) = handle();
        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        let id = add(&handle, "a task already done", opts).unwrap().id;
        complete(&handle, &id, CompleteOptions { skip_notes: true, ..Default::default() }).unwrap();

        let result = cancel(&handle, &id, "too late", false);
        assert!(matches!(result, Err(TodoError::InvalidStatusTransition { .. })));
        let active = handle.read_active().unwrap();
        assert_eq!(active.find(&id).unwrap().status, Status::Done, "a rejected cancel must not mutate the task");
    }

    #[test]
    fn cancel_cascade_skips_already_terminal_descendants_but_cancels_the_primary() {
        let (_td, handle) = handle();
        let mut epic_opts = AddOptions::default();
        epic_opts.max_active_tasks = 1;
        epic_opts.task_type = Some(TaskType::Epic);
        let epic = add(&handle, "an epic with a finished child", epic_opts).unwrap().id;

        let mut child_opts = AddOptions::default();
        child_opts.max_active_tasks = 1;
        child_opts.parent_id = Some(epic.clone());
        let child = add(&handle, "a child already done", child_opts).unwrap().id;
        complete(&handle, &child, CompleteOptions { skip_notes: true, ..Default::default() }).unwrap();

        cancel(&handle, &epic, "scope cut", true).unwrap();
        let active = handle.read_active().unwrap();
        assert_eq!(active.find(&epic).unwrap().status, Status::Cancelled);
        assert_eq!(active.find(&child).unwrap().status, Status::Done, "an already-terminal descendant is left untouched");
    }

    #[test]
    fn promote_clears_parent() {
        let (_td, handle) = handle();
        let mut epic_opts = AddOptions::default();
        epic_opts.max_active_tasks = 1;
        epic_opts.task_type = Some(TaskType::Epic);
        let epic = add(&handle, "an epic task here", epic_opts).unwrap().id;

        let mut child_opts = AddOptions::default();
        child_opts.max_active_tasks = 1;
        child_opts.parent_id = Some(epic);
        let child = add(&handle, "a child task here", child_opts).unwrap().id;

        promote(&handle, &child, true).unwrap();
        let active = handle.read_active().unwrap();
        assert!(active.find(&child).unwrap().parent_id.is_none());
    }
}
