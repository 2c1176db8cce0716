//! `add` (spec §4.7).

use chrono::Utc;
use std::collections::BTreeSet;
use todo_graph::TaskGraph;
use todo_model::{Priority, Size, Status, Task, TaskBuilder, TaskType};
use todo_utils::error::TodoError;

use crate::handle::{StoreHandle, audit_entry};

/// Options accepted by [`add`]. Fields default the way spec §4.7 describes:
/// priority `medium`, status `pending`.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub task_type: Option<TaskType>,
    pub size: Option<Size>,
    pub parent_id: Option<String>,
    pub depends: BTreeSet<String>,
    pub phase: Option<String>,
    pub labels: BTreeSet<String>,
    pub description: Option<String>,
    /// Permit referencing a phase slug that does not exist yet in the
    /// project's phase map (`--add-phase`).
    pub add_phase: bool,
    pub max_active_tasks: u32,
}

/// Outcome of a successful [`add`]: the new task's id plus any non-fatal
/// warnings the caller should surface (spec §4.7).
#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub id: String,
    pub warnings: Vec<String>,
}

/// Allocate an id, validate every precondition, and insert a new task.
/// Title duplication is a warning surfaced by the caller, never an error.
pub fn add(handle: &StoreHandle, title: &str, opts: AddOptions) -> Result<AddOutcome, TodoError> {
    let sequence = todo_store::SequenceAllocator::new(handle.paths.sequence_file());

    handle.mutate_active(|active, archive| {
        if let Some(phase) = &opts.phase {
            if !active.project.phases.contains_key(phase) {
                if !opts.add_phase {
                    return Err(TodoError::PhaseNotFound { slug: phase.clone() });
                }
                let next_order = active.project.phases.values().map(|p| p.order).max().map_or(0, |o| o + 1);
                active.project.phases.insert(phase.clone(), todo_model::Phase::new(phase.clone(), next_order));
            }
        }

        let graph = TaskGraph::new(&active.tasks);
        for dep in &opts.depends {
            if graph.get(dep).is_none() {
                return Err(TodoError::TaskNotFound { id: dep.clone() });
            }
        }

        let parent_type = if let Some(parent_id) = &opts.parent_id {
            let parent = graph.get(parent_id).ok_or_else(|| TodoError::TaskNotFound { id: parent_id.clone() })?;
            if parent.task_type == TaskType::Subtask {
                return Err(TodoError::SubtaskCannotHaveChildren { id: parent_id.clone() });
            }
            graph.validate_depth(parent_id)?;
            graph.validate_siblings(parent_id)?;
            Some(parent.task_type)
        } else {
            None
        };

        let status = opts.status.unwrap_or(Status::Pending);
        if status == Status::Active {
            let active_count = active.tasks.iter().filter(|t| t.status == Status::Active).count();
            if active_count >= opts.max_active_tasks as usize {
                return Err(TodoError::SingleActiveViolation {
                    max: opts.max_active_tasks,
                    current: active_count as u32,
                });
            }
        }

        let id = sequence.next()?;
        let mut builder = TaskBuilder::new(&id, title, Utc::now())
            .status(status)
            .priority(opts.priority.unwrap_or(Priority::Medium))
            .depends(opts.depends.clone())
            .labels(opts.labels.clone());
        if let Some(t) = opts.task_type {
            builder = builder.task_type(t);
        }
        if let Some(size) = opts.size {
            builder = builder.size(size);
        }
        if let Some(parent_id) = &opts.parent_id {
            builder = builder.parent_id(parent_id.clone());
        }
        if let Some(phase) = &opts.phase {
            builder = builder.phase(phase.clone());
        }
        if let Some(description) = &opts.description {
            builder = builder.description(description.clone());
        }
        builder = builder.infer_type_from_parent(parent_type);

        let duplicate_of: Vec<String> = active
            .tasks
            .iter()
            .filter(|t| t.title.eq_ignore_ascii_case(title))
            .map(|t| t.id.clone())
            .chain(
                archive
                    .archived_tasks
                    .iter()
                    .filter(|t| t.task.title.eq_ignore_ascii_case(title))
                    .map(|t| t.task.id.clone()),
            )
            .collect();

        let task: Task = builder.build()?;
        let new_id = task.id.clone();
        active.tasks.push(task);

        let warnings = if duplicate_of.is_empty() {
            Vec::new()
        } else {
            vec![format!("a task with the same title already exists: {}", duplicate_of.join(", "))]
        };
        Ok(AddOutcome { id: new_id, warnings })
    }).inspect(|outcome| {
        let mut entry = audit_entry("task.add", Some(outcome.id.clone()));
        entry.details = Some(serde_json::json!({"title": title}));
        let _ = handle.append_audit(entry);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use todo_utils::paths::StorePaths;

    fn handle() -> (tempfile::TempDir, StoreHandle) {
        let td = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join(".todo")).unwrap();
        (td, StoreHandle::new(StorePaths::new(root)))
    }

    #[test]
    fn add_allocates_sequential_ids() {
        let (_td, handle) = handle();
        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        let first = add(&handle, "first task here", opts.clone()).unwrap();
        let second = add(&handle, "second task here", opts).unwrap();
        assert_eq!(first.id, "T001");
        assert_eq!(second.id, "T002");
    }

    #[test]
    fn add_rejects_unknown_phase_without_add_phase() {
        let (_td, handle) = handle();
        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        opts.phase = Some("ghost".to_string());
        let result = add(&handle, "needs a real phase", opts);
        assert!(matches!(result, Err(TodoError::PhaseNotFound { .. })));
    }

    #[test]
    fn add_rejects_missing_dependency() {
        let (_td, handle) = handle();
        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        opts.depends = ["T999".to_string()].into_iter().collect();
        let result = add(&handle, "depends on nothing real", opts);
        assert!(matches!(result, Err(TodoError::TaskNotFound { .. })));
    }

    #[test]
    fn add_warns_on_duplicate_title_but_still_succeeds() {
        let (_td, handle) = handle();
        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        let first = add(&handle, "Ship the release", opts.clone()).unwrap();
        assert!(first.warnings.is_empty());

        let second = add(&handle, "ship the release", opts).unwrap();
        assert_eq!(second.warnings.len(), 1);
        assert!(second.warnings[0].contains(&first.id));
    }
}
