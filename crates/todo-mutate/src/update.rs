//! `update` (spec §4.7, §7 status-transition table).
//!
//! Status transitions to `done` go through [`crate::complete::complete`]
//! only; transitions out of `done`/`cancelled` go through
//! [`crate::lifecycle::reopen`]/[`crate::lifecycle::uncancel`]. `update`
//! covers the remaining pending/active/blocked moves plus non-status
//! field edits.

use std::collections::BTreeSet;
use todo_graph::TaskGraph;
use todo_model::{Priority, Status};
use todo_utils::error::TodoError;

use crate::handle::{StoreHandle, audit_entry};

/// `None` means "leave the field unchanged"; `Some(None)` is not
/// representable here because none of these fields need to support
/// explicit clearing through `update` (clearing `blockedBy` happens
/// implicitly when status leaves `blocked`).
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub phase: Option<String>,
    pub description: Option<String>,
    pub blocked_by: Option<String>,
    pub labels: Option<BTreeSet<String>>,
    pub add_depends: BTreeSet<String>,
    pub remove_depends: BTreeSet<String>,
    pub parent_id: Option<String>,
    /// Only consulted when `status` targets `Active` (spec §3 invariant 2).
    pub max_active_tasks: u32,
}

const NON_TERMINAL_TARGETS: &[Status] = &[Status::Pending, Status::Active, Status::Blocked];

pub fn update(handle: &StoreHandle, id: &str, changes: TaskChanges) -> Result<(), TodoError> {
    handle.mutate_active(|active, _archive| {
        // Validate everything before mutating so a failure leaves the
        // in-memory task (and thus the file) untouched.
        if let Some(target) = changes.status {
            let current = active.find(id).ok_or_else(|| TodoError::TaskNotFound { id: id.to_string() })?.status;
            validate_status_transition(current, target)?;
            if target == Status::Blocked && changes.blocked_by.is_none() {
                return Err(TodoError::InvalidInput {
                    message: "blockedBy is required when transitioning to blocked".to_string(),
                });
            }
            if target == Status::Active && current != Status::Active {
                let active_count = active.tasks.iter().filter(|t| t.id != id && t.status == Status::Active).count();
                if active_count >= changes.max_active_tasks as usize {
                    return Err(TodoError::SingleActiveViolation {
                        max: changes.max_active_tasks,
                        current: active_count as u32,
                    });
                }
            }
        }

        if !changes.add_depends.is_empty() {
            let graph = TaskGraph::new(&active.tasks);
            for dep in &changes.add_depends {
                if graph.get(dep).is_none() {
                    return Err(TodoError::TaskNotFound { id: dep.clone() });
                }
                if graph.dependency_cycle(id, dep) {
                    return Err(TodoError::DependencyCycle { from: id.to_string(), to: dep.clone() });
                }
            }
        }

        if let Some(parent_id) = &changes.parent_id {
            let graph = TaskGraph::new(&active.tasks);
            let parent = graph.get(parent_id).ok_or_else(|| TodoError::TaskNotFound { id: parent_id.clone() })?;
            if parent.task_type == todo_model::TaskType::Subtask {
                return Err(TodoError::SubtaskCannotHaveChildren { id: parent_id.clone() });
            }
            graph.validate_depth(parent_id)?;
            graph.validate_siblings(parent_id)?;
        }

        let task = active.find_mut(id).ok_or_else(|| TodoError::TaskNotFound { id: id.to_string() })?;

        if let Some(title) = changes.title {
            let len = title.chars().count();
            if !(3..=200).contains(&len) {
                return Err(TodoError::InvalidInput { message: format!("title must be 3-200 characters, got {len}") });
            }
            task.title = title;
        }
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        if let Some(phase) = changes.phase {
            task.phase = Some(phase);
        }
        if let Some(description) = changes.description {
            task.description = Some(description);
        }
        if let Some(labels) = changes.labels {
            task.labels = labels;
        }
        for dep in changes.add_depends {
            task.depends.insert(dep);
        }
        for dep in &changes.remove_depends {
            task.depends.remove(dep);
        }
        if let Some(parent_id) = changes.parent_id {
            task.parent_id = Some(parent_id);
        }
        if let Some(target) = changes.status {
            task.status = target;
            if target == Status::Blocked {
                task.blocked_by = changes.blocked_by;
            } else {
                task.blocked_by = None;
            }
        }
        task.updated_at = Some(chrono::Utc::now());

        Ok(())
    })?;

    handle.append_audit(audit_entry("task.update", Some(id.to_string())))
}

fn validate_status_transition(from: Status, to: Status) -> Result<(), TodoError> {
    if from == to {
        return Ok(());
    }
    if !NON_TERMINAL_TARGETS.contains(&to) {
        return Err(TodoError::InvalidStatusTransition {
            id: String::new(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    match from {
        Status::Pending | Status::Active | Status::Blocked => Ok(()),
        Status::Done | Status::Cancelled => Err(TodoError::InvalidStatusTransition {
            id: String::new(),
            from: from.to_string(),
            to: to.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::add::{AddOptions, add};
    use todo_utils::paths::StorePaths;

    fn handle() -> (tempfile::TempDir, StoreHandle) {
        let td = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join(".todo")).unwrap();
        (td, StoreHandle::new(StorePaths::new(root)))
    }

    #[test]
    fn allows_pending_to_active() {
        let (_td, handle) = handle();
        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        let id = add(&handle, "a task to update here", opts).unwrap().id;
        let changes = TaskChanges { status: Some(Status::Active), max_active_tasks: 1, ..Default::default() };
        update(&handle, &id, changes).unwrap();
        let active = handle.read_active().unwrap();
        assert_eq!(active.find(&id).unwrap().status, Status::Active);
    }

    #[test]
    fn rejects_activating_a_second_task_over_the_cap() {
        let (_td, handle) = handle();
        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        opts.status = Some(Status::Active);
        add(&handle, "already active", opts.clone()).unwrap();
        opts.status = None;
        let pending = add(&handle, "still pending", opts).unwrap().id;

        let changes = TaskChanges { status: Some(Status::Active), max_active_tasks: 1, ..Default::default() };
        let result = update(&handle, &pending, changes);
        assert!(matches!(result, Err(TodoError::SingleActiveViolation { .. })));
    }

    #[test]
    fn rejects_adding_a_cycle() {
        let (_td, handle) = handle();
        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        let t1 = add(&handle, "first task here", opts.clone()).unwrap().id;
        opts.depends = [t1.clone()].into_iter().collect();
        let t2 = add(&handle, "second task here", opts).unwrap().id;

        let changes = TaskChanges { add_depends: [t2].into_iter().collect(), ..Default::default() };
        let result = update(&handle, &t1, changes);
        assert!(matches!(result, Err(TodoError::DependencyCycle { .. })));
    }
}
