//! Task verification gates (spec §4.11).

use chrono::Utc;
use todo_model::verification::{FailureLogEntry, GateName};
use todo_model::Verification;
use todo_mutate::handle::{audit_entry, StoreHandle};
use todo_utils::error::TodoError;

/// Set one gate on `id`'s verification map. Setting a gate to `false`
/// increments `round` and appends a failure log entry; setting it to
/// `true` only recomputes `passed`.
pub fn set_gate(
    handle: &StoreHandle,
    id: &str,
    gate: GateName,
    value: bool,
    agent: Option<String>,
    reason: Option<String>,
) -> Result<Verification, TodoError> {
    let result = handle.mutate_active(|active, _archive| {
        let task = active
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TodoError::TaskNotFound { id: id.to_string() })?;

        task.verification.gates.insert(gate, value);
        task.verification.last_agent = agent.clone();
        task.verification.last_updated = Some(Utc::now());

        if !value {
            task.verification.round += 1;
            task.verification.failure_log.push(FailureLogEntry {
                round: task.verification.round,
                agent: agent.clone(),
                reason: reason.clone().unwrap_or_else(|| format!("{gate} set to false")),
                timestamp: Utc::now(),
            });
        }

        task.verification.recompute_passed(GateName::default_required());
        Ok(task.verification.clone())
    })?;

    let mut entry = audit_entry("task.setGate", Some(id.to_string()));
    entry.details = Some(serde_json::json!({"gate": gate.to_string(), "value": value}));
    let _ = handle.append_audit(entry);

    Ok(result)
}

/// Reset `id`'s verification record to its initial (all-gates-false) state.
pub fn reset(handle: &StoreHandle, id: &str) -> Result<Verification, TodoError> {
    let result = handle.mutate_active(|active, _archive| {
        let task = active
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TodoError::TaskNotFound { id: id.to_string() })?;
        task.verification = Verification::default();
        Ok(task.verification.clone())
    })?;

    let _ = handle.append_audit(audit_entry("task.resetGates", Some(id.to_string())));
    Ok(result)
}

/// Read-only view of `id`'s verification record.
pub fn gate_status(handle: &StoreHandle, id: &str) -> Result<Verification, TodoError> {
    let active = handle.read_active()?;
    active
        .tasks
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.verification.clone())
        .ok_or_else(|| TodoError::TaskNotFound { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use todo_utils::paths::StorePaths;

    fn handle_with_task() -> (tempfile::TempDir, StoreHandle, String) {
        let td = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join(".todo")).unwrap();
        let handle = StoreHandle::new(StorePaths::new(root));
        let id = todo_mutate::add::add(&handle, "gate me", todo_mutate::add::AddOptions {
            max_active_tasks: 1,
            ..Default::default()
        })
        .unwrap()
        .id;
        (td, handle, id)
    }

    #[test]
    fn setting_gate_false_increments_round_and_logs_failure() {
        let (_td, handle, id) = handle_with_task();
        let v = set_gate(&handle, &id, GateName::TestsPassed, false, Some("agent-1".to_string()), None).unwrap();
        assert_eq!(v.round, 1);
        assert_eq!(v.failure_log.len(), 1);
        assert!(!v.passed);
    }

    #[test]
    fn passing_every_required_gate_marks_passed() {
        let (_td, handle, id) = handle_with_task();
        for gate in GateName::default_required() {
            set_gate(&handle, &id, *gate, true, None, None).unwrap();
        }
        let status = gate_status(&handle, &id).unwrap();
        assert!(status.passed);
    }

    #[test]
    fn reset_clears_round_and_failure_log() {
        let (_td, handle, id) = handle_with_task();
        set_gate(&handle, &id, GateName::TestsPassed, false, None, None).unwrap();
        let v = reset(&handle, &id).unwrap();
        assert_eq!(v.round, 0);
        assert!(v.failure_log.is_empty());
    }
}
