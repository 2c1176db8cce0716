//! `archive`/`unarchive` (spec §4.7, §4.2 archive store).

use chrono::Utc;
use todo_config::Config;
use todo_model::{ArchivedTask, Status};
use todo_utils::error::TodoError;

use crate::handle::{StoreHandle, audit_entry};

/// Criteria governing [`archive_matching`]'s default, `--force`, and
/// `--all` sweeps (spec §4.7).
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveCriteria {
    /// Ignore `archive.daysUntilArchive` but still respect `preserveRecentCount`.
    pub force: bool,
    /// Ignore both age and `preserveRecentCount`.
    pub all: bool,
}

/// Sweep every `done` task matching the retention criteria out of the
/// active store, cleaning up any `depends` references that pointed at a
/// newly-archived id. Returns the archived ids.
pub fn archive_matching(handle: &StoreHandle, config: &Config, criteria: ArchiveCriteria) -> Result<Vec<String>, TodoError> {
    let days_until_archive = config.get_u64("archive.daysUntilArchive").unwrap_or(30) as i64;
    let preserve_recent_count = config.get_u64("archive.preserveRecentCount").unwrap_or(10) as usize;

    let archived_ids = handle.mutate_both(|active, archive| {
        let now = Utc::now();

        let mut done_by_recency: Vec<usize> = active
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.status == Status::Done)
            .map(|(idx, _)| idx)
            .collect();
        done_by_recency.sort_by_key(|&idx| std::cmp::Reverse(active.tasks[idx].completed_at));

        let protected: std::collections::BTreeSet<usize> = if criteria.all {
            std::collections::BTreeSet::new()
        } else {
            done_by_recency.iter().take(preserve_recent_count).copied().collect()
        };

        let mut to_archive: Vec<String> = Vec::new();
        for &idx in &done_by_recency {
            if protected.contains(&idx) {
                continue;
            }
            let task = &active.tasks[idx];
            let eligible = criteria.all
                || criteria.force
                || task.completed_at.is_some_and(|done| (now - done).num_days() >= days_until_archive);
            if eligible {
                to_archive.push(task.id.clone());
            }
        }

        for id in &to_archive {
            let idx = active.tasks.iter().position(|t| &t.id == id).expect("id collected from active.tasks above");
            let task = active.tasks.remove(idx);
            let cycle_time_days = task.completed_at.map(|done| (done - task.created_at).num_milliseconds() as f64 / 86_400_000.0);
            archive.archived_tasks.push(ArchivedTask {
                task,
                archived_at: now,
                archive_reason: "retention-criteria".to_string(),
                cycle_time_days,
                session_id: None,
            });
            if active.focus.current_task.as_deref() == Some(id.as_str()) {
                active.focus.current_task = None;
            }
        }

        let archived: std::collections::BTreeSet<&str> = to_archive.iter().map(String::as_str).collect();
        for task in &mut active.tasks {
            task.depends.retain(|dep| !archived.contains(dep.as_str()));
        }

        Ok(to_archive)
    })?;

    let mut entry = audit_entry("task.archive", None);
    entry.details = Some(serde_json::json!({ "archivedIds": archived_ids, "force": criteria.force, "all": criteria.all }));
    handle.append_audit(entry)?;

    Ok(archived_ids)
}

/// Move a terminal task (`done` or `cancelled`) out of the active store and
/// into the archive, recording cycle time when `createdAt`/`completedAt`
/// are both known.
pub fn archive(handle: &StoreHandle, id: &str, reason: Option<String>) -> Result<(), TodoError> {
    handle.mutate_both(|active, archive| {
        let idx = active.tasks.iter().position(|t| t.id == id).ok_or_else(|| TodoError::TaskNotFound { id: id.to_string() })?;
        if !active.tasks[idx].is_terminal() {
            return Err(TodoError::InvalidStatusTransition {
                id: id.to_string(),
                from: active.tasks[idx].status.to_string(),
                to: "archived".to_string(),
            });
        }
        if archive.contains(id) {
            return Err(TodoError::IdCollision { id: id.to_string() });
        }

        let task = active.tasks.remove(idx);
        let cycle_time_days = task.completed_at.map(|done| (done - task.created_at).num_milliseconds() as f64 / 86_400_000.0);
        let archive_reason = reason.unwrap_or_else(|| match task.status {
            Status::Cancelled => "cancelled".to_string(),
            _ => "completed".to_string(),
        });

        archive.archived_tasks.push(ArchivedTask {
            task,
            archived_at: Utc::now(),
            archive_reason,
            cycle_time_days,
            session_id: None,
        });

        if active.focus.current_task.as_deref() == Some(id) {
            active.focus.current_task = None;
        }

        Ok(())
    })?;

    handle.append_audit(audit_entry("task.archive", Some(id.to_string())))
}

/// Restore an archived task back into the active store. Rejects a
/// collision with an existing active id (a duplicate should be fixed via
/// `validate --fix` first).
pub fn unarchive(handle: &StoreHandle, id: &str) -> Result<(), TodoError> {
    handle.mutate_both(|active, archive| {
        let idx = archive
            .archived_tasks
            .iter()
            .position(|a| a.task.id == id)
            .ok_or_else(|| TodoError::TaskNotFound { id: id.to_string() })?;
        if active.find(id).is_some() {
            return Err(TodoError::IdCollision { id: id.to_string() });
        }
        let archived = archive.archived_tasks.remove(idx);
        active.tasks.push(archived.task);
        Ok(())
    })?;

    handle.append_audit(audit_entry("task.unarchive", Some(id.to_string())))
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
    fn rejects_archiving_non_terminal_task() {
        let (_td, handle) = handle();
        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        let id = add(&handle, "a task not yet done", opts).unwrap().id;
        assert!(archive(&handle, &id, None).is_err());
    }

    #[test]
    fn archive_then_unarchive_round_trips() {
        let (_td, handle) = handle();
        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        let id = add(&handle, "a task soon archived", opts).unwrap().id;
        complete(&handle, &id, CompleteOptions { skip_notes: true, ..Default::default() }).unwrap();

        archive(&handle, &id, None).unwrap();
        assert!(handle.read_active().unwrap().find(&id).is_none());
        assert!(handle.read_archive().unwrap().find(&id).is_some());

        unarchive(&handle, &id).unwrap();
        assert!(handle.read_active().unwrap().find(&id).is_some());
        assert!(handle.read_archive().unwrap().find(&id).is_none());
    }
}
