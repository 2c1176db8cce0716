//! Phase lifecycle state machine (spec §4.9): `pending → active →
//! completed`, plus rename and delete.

use chrono::Utc;
use todo_config::Config;
use todo_model::{PhaseHistoryEntry, PhaseStatus, PhaseTransitionType, Status};
use todo_mutate::handle::{StoreHandle, audit_entry};
use todo_utils::error::TodoError;

/// `start(slug)`: requires current status `pending`; appends a history entry.
pub fn start(handle: &StoreHandle, slug: &str) -> Result<(), TodoError> {
    handle.mutate_active(|active, _archive| {
        let task_count = active.tasks.iter().filter(|t| t.phase.as_deref() == Some(slug)).count();
        let phase = active
            .project
            .phases
            .get_mut(slug)
            .ok_or_else(|| TodoError::PhaseNotFound { slug: slug.to_string() })?;
        if phase.status != PhaseStatus::Pending {
            return Err(TodoError::InvalidInput {
                message: format!("phase '{slug}' must be pending to start (is {})", phase.status),
            });
        }
        let now = Utc::now();
        phase.status = PhaseStatus::Active;
        phase.started_at = Some(now);
        active.project.current_phase = Some(slug.to_string());
        active.project.phase_history.push(PhaseHistoryEntry {
            phase: slug.to_string(),
            transition_type: PhaseTransitionType::Started,
            timestamp: now,
            task_count,
            from_phase: None,
            reason: None,
        });
        Ok(())
    })?;
    handle.append_audit(audit_entry("phase.start", None))
}

/// `complete(slug)`: requires every task in the phase to be `done`; records
/// duration via `completedAt - startedAt`.
pub fn complete(handle: &StoreHandle, slug: &str) -> Result<(), TodoError> {
    handle.mutate_active(|active, _archive| complete_locked(active, slug))?;
    handle.append_audit(audit_entry("phase.complete", None))
}

fn complete_locked(active: &mut todo_model::ActiveStore, slug: &str) -> Result<(), TodoError> {
    let in_phase: Vec<_> = active.tasks.iter().filter(|t| t.phase.as_deref() == Some(slug)).collect();
    let task_count = in_phase.len();
    if in_phase.iter().any(|t| t.status != Status::Done) {
        return Err(TodoError::InvalidInput {
            message: format!("all tasks in phase '{slug}' must be done before it can complete"),
        });
    }

    let now = Utc::now();
    let phase = active
        .project
        .phases
        .get_mut(slug)
        .ok_or_else(|| TodoError::PhaseNotFound { slug: slug.to_string() })?;
    phase.status = PhaseStatus::Completed;
    phase.completed_at = Some(now);

    active.project.phase_history.push(PhaseHistoryEntry {
        phase: slug.to_string(),
        transition_type: PhaseTransitionType::Completed,
        timestamp: now,
        task_count,
        from_phase: None,
        reason: None,
    });
    Ok(())
}

/// Options controlling [`advance`]'s guards.
#[derive(Debug, Clone, Default)]
pub struct AdvanceOptions {
    pub force: bool,
}

/// (1) complete the current phase if still active, (2) start the next
/// phase by order. Two guards run, in order, before completing: the
/// critical-task block (never overridable) and the completion-threshold
/// check (overridable with `force`). The interactive-prompt guard from
/// spec §4.9 belongs to the external CLI/TTY layer, not this core
/// operation.
pub fn advance(handle: &StoreHandle, config: &Config, opts: AdvanceOptions) -> Result<Option<String>, TodoError> {
    let next_slug = handle.mutate_active(|active, _archive| {
        if let Some(current_slug) = active.project.current_phase.clone() {
            let current = active
                .project
                .phases
                .get(&current_slug)
                .ok_or_else(|| TodoError::PhaseNotFound { slug: current_slug.clone() })?;
            if current.status == PhaseStatus::Active {
                let in_phase: Vec<_> =
                    active.tasks.iter().filter(|t| t.phase.as_deref() == Some(current_slug.as_str())).collect();

                let block_on_critical =
                    config.get_bool("validation.phaseValidation.blockOnCriticalTasks").unwrap_or(true);
                if block_on_critical
                    && in_phase.iter().any(|t| t.priority == todo_model::Priority::Critical && t.status != Status::Done)
                {
                    return Err(TodoError::PhaseAdvanceBlocked {
                        slug: current_slug.clone(),
                        reason: "incomplete critical-priority task(s)".to_string(),
                    });
                }

                let total = in_phase.len();
                let done = in_phase.iter().filter(|t| t.status == Status::Done).count();
                let completion_percent = if total == 0 { 100.0 } else { (done as f64 / total as f64) * 100.0 };
                let threshold =
                    config.get_f64("validation.phaseValidation.phaseAdvanceThreshold").unwrap_or(100.0);
                if completion_percent < threshold && !opts.force {
                    return Err(TodoError::PhaseAdvanceBlocked {
                        slug: current_slug.clone(),
                        reason: format!("completionPercent:{completion_percent:.0}, threshold:{threshold:.0}"),
                    });
                }

                complete_locked(active, &current_slug)?;
            }
        }

        let next = active
            .project
            .phases
            .iter()
            .filter(|(_, p)| p.status == PhaseStatus::Pending)
            .min_by_key(|(_, p)| p.order)
            .map(|(slug, _)| slug.clone());

        if let Some(slug) = &next {
            start_locked(active, slug)?;
        }
        Ok(next)
    })?;

    handle.append_audit(audit_entry("phase.advance", None))?;
    Ok(next_slug)
}

fn start_locked(active: &mut todo_model::ActiveStore, slug: &str) -> Result<(), TodoError> {
    let task_count = active.tasks.iter().filter(|t| t.phase.as_deref() == Some(slug)).count();
    let now = Utc::now();
    let phase = active
        .project
        .phases
        .get_mut(slug)
        .ok_or_else(|| TodoError::PhaseNotFound { slug: slug.to_string() })?;
    phase.status = PhaseStatus::Active;
    phase.started_at = Some(now);
    active.project.current_phase = Some(slug.to_string());
    active.project.phase_history.push(PhaseHistoryEntry {
        phase: slug.to_string(),
        transition_type: PhaseTransitionType::Started,
        timestamp: now,
        task_count,
        from_phase: None,
        reason: None,
    });
    Ok(())
}

/// Direct status-preserving move of `project.currentPhase`/`focus.currentPhase`
/// to `slug`. Moving to a lower-order phase than the current one is a
/// "rollback" and requires `allow_rollback`.
pub fn set(handle: &StoreHandle, slug: &str, allow_rollback: bool) -> Result<(), TodoError> {
    handle.mutate_active(|active, _archive| {
        let target_order = active
            .project
            .phases
            .get(slug)
            .ok_or_else(|| TodoError::PhaseNotFound { slug: slug.to_string() })?
            .order;

        if let Some(current_slug) = &active.project.current_phase
            && let Some(current) = active.project.phases.get(current_slug)
            && target_order < current.order
            && !allow_rollback
        {
            return Err(TodoError::InvalidInput {
                message: format!("moving from '{current_slug}' to '{slug}' is a rollback; pass allow_rollback"),
            });
        }

        let from_phase = active.project.current_phase.clone();
        let is_rollback = from_phase
            .as_deref()
            .and_then(|s| active.project.phases.get(s))
            .is_some_and(|current| target_order < current.order);
        active.project.current_phase = Some(slug.to_string());
        active.focus.current_phase = Some(slug.to_string());

        if from_phase.as_deref() != Some(slug) {
            active.project.phase_history.push(PhaseHistoryEntry {
                phase: slug.to_string(),
                transition_type: if is_rollback { PhaseTransitionType::RolledBack } else { PhaseTransitionType::Set },
                timestamp: Utc::now(),
                task_count: active.tasks.iter().filter(|t| t.phase.as_deref() == Some(slug)).count(),
                from_phase,
                reason: None,
            });
        }
        Ok(())
    })?;
    handle.append_audit(audit_entry("phase.set", None))
}

/// Atomically rename `old` to `new`: the phase map key, every referring
/// task's `phase` field, and `project.currentPhase`/`focus.currentPhase`
/// when they match.
pub fn rename(handle: &StoreHandle, old: &str, new: &str) -> Result<(), TodoError> {
    if !todo_model::phase::is_valid_slug(new) {
        return Err(TodoError::InvalidInput { message: format!("'{new}' is not a valid phase slug") });
    }

    handle.mutate_active(|active, _archive| {
        if active.project.phases.contains_key(new) {
            return Err(TodoError::InvalidInput { message: format!("phase '{new}' already exists") });
        }
        let phase = active
            .project
            .phases
            .remove(old)
            .ok_or_else(|| TodoError::PhaseNotFound { slug: old.to_string() })?;
        active.project.phases.insert(new.to_string(), phase);

        for task in &mut active.tasks {
            if task.phase.as_deref() == Some(old) {
                task.phase = Some(new.to_string());
                task.updated_at = Some(Utc::now());
            }
        }
        if active.project.current_phase.as_deref() == Some(old) {
            active.project.current_phase = Some(new.to_string());
        }
        if active.focus.current_phase.as_deref() == Some(old) {
            active.focus.current_phase = Some(new.to_string());
        }

        active.project.phase_history.push(PhaseHistoryEntry {
            phase: new.to_string(),
            transition_type: PhaseTransitionType::Renamed,
            timestamp: Utc::now(),
            task_count: active.tasks.iter().filter(|t| t.phase.as_deref() == Some(new)).count(),
            from_phase: Some(old.to_string()),
            reason: None,
        });
        Ok(())
    })?;
    handle.append_audit(audit_entry("phase.rename", None))
}

/// `delete(slug)`: the caller enforces the `--force` precondition. If the
/// phase has tasks, `reassign_to` must name a different existing phase.
pub fn delete(handle: &StoreHandle, slug: &str, reassign_to: Option<&str>) -> Result<(), TodoError> {
    handle.mutate_active(|active, _archive| {
        if active.project.current_phase.as_deref() == Some(slug) {
            return Err(TodoError::InvalidInput { message: format!("cannot delete the current phase '{slug}'") });
        }
        if !active.project.phases.contains_key(slug) {
            return Err(TodoError::PhaseNotFound { slug: slug.to_string() });
        }

        let has_tasks = active.tasks.iter().any(|t| t.phase.as_deref() == Some(slug));
        if has_tasks {
            let target = reassign_to.ok_or_else(|| TodoError::InvalidInput {
                message: format!("phase '{slug}' has tasks; pass reassign_to"),
            })?;
            if !active.project.phases.contains_key(target) {
                return Err(TodoError::PhaseNotFound { slug: target.to_string() });
            }
            for task in &mut active.tasks {
                if task.phase.as_deref() == Some(slug) {
                    task.phase = Some(target.to_string());
                    task.updated_at = Some(Utc::now());
                }
            }
        }

        active.project.phases.remove(slug);
        Ok(())
    })?;
    handle.append_audit(audit_entry("phase.delete", None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use todo_model::{Phase, Priority};
    use todo_mutate::add::{AddOptions, add};
    use todo_utils::paths::StorePaths;

    fn handle() -> (tempfile::TempDir, StoreHandle) {
        let td = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join(".todo")).unwrap();
        (td, StoreHandle::new(StorePaths::new(root)))
    }

    fn config() -> Config {
        Config::load(camino::Utf8PathBuf::from("/nonexistent/p.json"), camino::Utf8PathBuf::from("/nonexistent/g.json"), serde_json::json!({})).unwrap()
    }

    fn seed_phases(handle: &StoreHandle) {
        handle
            .mutate_active(|active, _| {
                active.project.phases.insert("design".to_string(), Phase::new("design", 0));
                active.project.phases.insert("build".to_string(), Phase::new("build", 1));
                Ok::<_, TodoError>(())
            })
            .unwrap();
    }

    #[test]
    fn start_requires_pending() {
        let (_td, handle) = handle();
        seed_phases(&handle);
        start(&handle, "design").unwrap();
        assert!(start(&handle, "design").is_err());
    }

    #[test]
    fn complete_requires_all_done() {
        let (_td, handle) = handle();
        seed_phases(&handle);
        start(&handle, "design").unwrap();

        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        opts.phase = Some("design".to_string());
        let id = add(&handle, "a task in the design phase", opts).unwrap().id;

        assert!(complete(&handle, "design").is_err());

        handle
            .mutate_active(|active, _| {
                let t = active.find_mut(&id).unwrap();
                t.status = Status::Done;
                t.completed_at = Some(Utc::now());
                Ok::<_, TodoError>(())
            })
            .unwrap();

        complete(&handle, "design").unwrap();
    }

    #[test]
    fn advance_blocks_on_incomplete_critical_task() {
        let (_td, handle) = handle();
        seed_phases(&handle);
        start(&handle, "design").unwrap();

        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        opts.phase = Some("design".to_string());
        opts.priority = Some(Priority::Critical);
        add(&handle, "a critical design task", opts).unwrap();

        let result = advance(&handle, &config(), AdvanceOptions { force: true });
        assert!(result.is_err());
    }

    #[test]
    fn rename_updates_tasks_and_current_phase() {
        let (_td, handle) = handle();
        seed_phases(&handle);
        start(&handle, "design").unwrap();

        let mut opts = AddOptions::default();
        opts.max_active_tasks = 1;
        opts.phase = Some("design".to_string());
        let id = add(&handle, "a task to be renamed along", opts).unwrap().id;

        rename(&handle, "design", "discovery").unwrap();

        let active = handle.read_active().unwrap();
        assert!(!active.project.phases.contains_key("design"));
        assert!(active.project.phases.contains_key("discovery"));
        assert_eq!(active.find(&id).unwrap().phase.as_deref(), Some("discovery"));
        assert_eq!(active.project.current_phase.as_deref(), Some("discovery"));
    }

    #[test]
    fn set_forward_jump_records_set_not_rolled_back() {
        let (_td, handle) = handle();
        seed_phases(&handle);
        start(&handle, "design").unwrap();

        set(&handle, "build", false).unwrap();

        let active = handle.read_active().unwrap();
        assert_eq!(active.project.current_phase.as_deref(), Some("build"));
        let last = active.project.phase_history.last().unwrap();
        assert_eq!(last.transition_type, PhaseTransitionType::Set);
    }

    #[test]
    fn set_backward_jump_is_blocked_without_allow_rollback_and_records_rolled_back_once_allowed() {
        let (_td, handle) = handle();
        seed_phases(&handle);
        start(&handle, "design").unwrap();
        set(&handle, "build", false).unwrap();

        assert!(set(&handle, "design", false).is_err());

        set(&handle, "design", true).unwrap();
        let active = handle.read_active().unwrap();
        assert_eq!(active.project.current_phase.as_deref(), Some("design"));
        let last = active.project.phase_history.last().unwrap();
        assert_eq!(last.transition_type, PhaseTransitionType::RolledBack);
    }

    #[test]
    fn delete_refuses_current_phase() {
        let (_td, handle) = handle();
        seed_phases(&handle);
        start(&handle, "design").unwrap();
        assert!(delete(&handle, "design", None).is_err());
        assert!(delete(&handle, "build", None).is_ok());
    }
}
