//! Deterministic, non-interactive repairs (spec §4.6 `--fix`,
//! `--fix-duplicates`). Interactive selection belongs to the external
//! collaborator; this module only implements the fallback defaults
//! (keep-first, keep-active) required when stdin is not a terminal.

use chrono::Utc;
use todo_model::{ActiveStore, ArchiveStore, Status};
use todo_store::checksum;
use todo_utils::error::TodoError;

/// A human-readable record of one applied repair, for the audit entry's
/// `details`.
#[derive(Debug, Clone, Default)]
pub struct FixOutcome {
    pub applied: Vec<String>,
}

/// Apply every deterministic repair to `active`, reconciling against
/// `archive` where cross-store state matters (sequence repair).
pub fn fix(
    active: &mut ActiveStore,
    archive: &ArchiveStore,
    sequence: &todo_store::SequenceAllocator,
) -> Result<FixOutcome, TodoError> {
    let mut applied = Vec::new();

    for task in &mut active.tasks {
        if task.status == Status::Done && task.completed_at.is_none() {
            let derived = task.updated_at.unwrap_or(task.created_at);
            task.completed_at = Some(derived);
            applied.push(format!("{}: derived completedAt from last-updated", task.id));
        }
    }

    let ids: std::collections::HashSet<String> = active.tasks.iter().map(|t| t.id.clone()).collect();
    for task in &mut active.tasks {
        let before = task.depends.len();
        task.depends.retain(|d| ids.contains(d));
        if task.depends.len() != before {
            applied.push(format!("{}: removed dangling depends references", task.id));
        }
        if let Some(parent) = &task.parent_id {
            if !ids.contains(parent) {
                applied.push(format!("{}: cleared dangling parentId {parent}", task.id));
                task.parent_id = None;
            }
        }
    }

    let active_ids: Vec<&str> =
        active.tasks.iter().filter(|t| t.status == Status::Active).map(|t| t.id.as_str()).collect();
    match (&active.focus.current_task, active_ids.as_slice()) {
        (Some(focused), [only]) if focused != only => {
            applied.push(format!("focus resynced from {focused} to {only}"));
            active.focus.current_task = Some((*only).to_string());
        }
        (Some(focused), []) => {
            applied.push(format!("focus cleared: {focused} is no longer active"));
            active.focus.current_task = None;
        }
        (None, [only]) => {
            applied.push(format!("focus set to the sole active task {only}"));
            active.focus.current_task = Some((*only).to_string());
        }
        _ => {}
    }

    let max_id = todo_utils::ids::max_counter(
        active
            .tasks
            .iter()
            .map(|t| t.id.as_str())
            .chain(archive.archived_tasks.iter().map(|t| t.task.id.as_str())),
    )?;
    if let todo_store::sequence::SequenceStatus::Drift { counter, .. } = sequence.check(max_id)? {
        let repaired = sequence.repair(max_id)?;
        applied.push(format!("sequence repaired from {counter} to {repaired}"));
    }

    let recomputed = checksum::compute_of(&active.tasks)?;
    if recomputed != active.meta.checksum {
        applied.push(format!("checksum rewritten: {} -> {recomputed}", active.meta.checksum));
        active.meta.checksum = recomputed;
        active.meta.last_modified = Utc::now();
    }

    Ok(FixOutcome { applied })
}

/// Remove duplicate ids within the active store (keep-first) and
/// cross-store collisions between active and archive (keep-active).
pub fn fix_duplicates(active: &mut ActiveStore, archive: &mut ArchiveStore) -> FixOutcome {
    let mut applied = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let before = active.tasks.len();
    active.tasks.retain(|t| seen.insert(t.id.clone()));
    if active.tasks.len() != before {
        applied.push(format!("removed {} duplicate id(s) within the active store (keep-first)", before - active.tasks.len()));
    }

    let active_ids: std::collections::HashSet<&str> = active.tasks.iter().map(|t| t.id.as_str()).collect();
    let before = archive.archived_tasks.len();
    archive.archived_tasks.retain(|t| !active_ids.contains(t.task.id.as_str()));
    if archive.archived_tasks.len() != before {
        applied.push(format!(
            "removed {} archived task(s) colliding with an active id (keep-active)",
            before - archive.archived_tasks.len()
        ));
    }

    FixOutcome { applied }
}
