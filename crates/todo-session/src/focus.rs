//! `focus set/clear/show/note/next` (spec §4.8): mutate only the focus
//! sub-record. Setting focus on a task transitions it to `active` and
//! demotes any previously-active in-scope task back to `pending`.

use chrono::Utc;
use std::time::Duration;
use todo_config::Config;
use todo_graph::TaskGraph;
use todo_model::{Focus, Status};
use todo_mutate::handle::audit_entry;
use todo_utils::error::TodoError;
use todo_utils::paths::StorePaths;

use crate::scope;
use crate::sessions_store;
use crate::txn;

fn bound_session_id(paths: &StorePaths) -> Result<String, TodoError> {
    sessions_store::read_binding(paths)?.ok_or(TodoError::SessionRequired)
}

/// Focus `task_id` within the bound session's scope.
///
/// Single-active enforcement is per scope when `multiSession.enabled` is
/// true and global otherwise (spec §4.8): with multi-session off, the
/// *only* mode reachable, any previously-active task anywhere in the
/// store is demoted, not just ones sharing this session's scope.
pub fn set(paths: &StorePaths, lock_timeout: Duration, config: &Config, task_id: &str) -> Result<(), TodoError> {
    let session_id = bound_session_id(paths)?;
    let multi_session = config.get_bool("multiSession.enabled").unwrap_or(false);

    txn::mutate(paths, lock_timeout, |active, sessions| {
        let session = sessions.find_mut(&session_id).ok_or_else(|| TodoError::SessionNotFound { id: session_id.clone() })?;
        let graph = TaskGraph::new(&active.tasks);
        let scope_ids = scope::task_ids(&graph, session.scope.scope_type, &session.scope.root_task_id, session.scope.phase.as_deref())?;
        if !scope_ids.contains(task_id) {
            return Err(TodoError::TaskNotInScope { id: task_id.to_string() });
        }

        let now = Utc::now();
        for task in &mut active.tasks {
            let in_scope = !multi_session || scope_ids.contains(&task.id);
            if task.status == Status::Active && task.id != task_id && in_scope {
                task.status = Status::Pending;
                task.updated_at = Some(now);
            }
        }
        let task = active.find_mut(task_id).ok_or_else(|| TodoError::TaskNotFound { id: task_id.to_string() })?;
        task.status = Status::Active;
        task.updated_at = Some(now);

        active.focus.current_task = Some(task_id.to_string());
        session.focus.current_task = Some(task_id.to_string());
        Ok(())
    })?;

    append_audit(paths, "focus.set", Some(session_id))
}

/// Clear the bound session's current task (the underlying task's status is
/// left as-is; only the pointer moves).
pub fn clear(paths: &StorePaths, lock_timeout: Duration) -> Result<(), TodoError> {
    let session_id = bound_session_id(paths)?;
    txn::mutate(paths, lock_timeout, |active, sessions| {
        let session = sessions.find_mut(&session_id).ok_or_else(|| TodoError::SessionNotFound { id: session_id.clone() })?;
        session.focus.current_task = None;
        active.focus.current_task = None;
        Ok(())
    })?;
    append_audit(paths, "focus.clear", Some(session_id))
}

/// Read-only view of the bound session's focus.
pub fn show(paths: &StorePaths) -> Result<Focus, TodoError> {
    let session_id = bound_session_id(paths)?;
    let sessions = sessions_store::load(paths)?;
    Ok(sessions.find(&session_id).ok_or_else(|| TodoError::SessionNotFound { id: session_id })?.focus.clone())
}

pub fn note(paths: &StorePaths, lock_timeout: Duration, text: String) -> Result<(), TodoError> {
    let session_id = bound_session_id(paths)?;
    txn::mutate_sessions(paths, lock_timeout, |sessions| {
        let session = sessions.find_mut(&session_id).ok_or_else(|| TodoError::SessionNotFound { id: session_id.clone() })?;
        session.focus.session_note = Some(text);
        Ok(())
    })
}

pub fn next(paths: &StorePaths, lock_timeout: Duration, text: String) -> Result<(), TodoError> {
    let session_id = bound_session_id(paths)?;
    txn::mutate_sessions(paths, lock_timeout, |sessions| {
        let session = sessions.find_mut(&session_id).ok_or_else(|| TodoError::SessionNotFound { id: session_id.clone() })?;
        session.focus.next_action = Some(text);
        Ok(())
    })
}

fn append_audit(paths: &StorePaths, action: &str, session_id: Option<String>) -> Result<(), TodoError> {
    let mut entry = audit_entry(action, None);
    entry.session_id = session_id;
    todo_store::audit::AuditLog::new(paths.audit_log()).append(&entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{FocusChoice, StartOptions, start};
    use todo_model::ScopeType;
    use todo_mutate::add::{AddOptions, add};
    use todo_mutate::handle::StoreHandle;

    fn paths() -> (tempfile::TempDir, StorePaths) {
        let td = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join(".todo")).unwrap();
        (td, StorePaths::new(root))
    }

    fn default_config() -> Config {
        Config::load(
            camino::Utf8PathBuf::from("/nonexistent/p.json"),
            camino::Utf8PathBuf::from("/nonexistent/g.json"),
            serde_json::json!({}),
        )
        .unwrap()
    }

    #[test]
    fn switching_focus_demotes_previous_task() {
        let (_td, paths) = paths();
        let handle = StoreHandle::new(paths.clone());
        let config = default_config();
        let mut opts = AddOptions::default();
        opts.max_active_tasks = 2;
        opts.task_type = Some(todo_model::TaskType::Epic);
        let epic = add(&handle, "an epic to scope focus on", opts.clone()).unwrap().id;

        opts.task_type = None;
        opts.parent_id = Some(epic.clone());
        let t1 = add(&handle, "first child task here", opts.clone()).unwrap().id;
        let t2 = add(&handle, "second child task here", opts).unwrap().id;

        start(
            &paths,
            todo_lock::DEFAULT_TIMEOUT,
            &config,
            ScopeType::Epic,
            &epic,
            None,
            FocusChoice::Task(t1.clone()),
            StartOptions::default(),
        )
        .unwrap();

        set(&paths, todo_lock::DEFAULT_TIMEOUT, &config, &t2).unwrap();

        let active = handle.read_active().unwrap();
        assert_eq!(active.find(&t1).unwrap().status, Status::Pending);
        assert_eq!(active.find(&t2).unwrap().status, Status::Active);
        assert_eq!(active.focus.current_task, Some(t2));
    }

    #[test]
    fn switching_focus_demotes_every_active_task_project_wide_without_multi_session() {
        let (_td, paths) = paths();
        let handle = StoreHandle::new(paths.clone());
        let config = default_config();

        let mut epic_opts = AddOptions::default();
        epic_opts.max_active_tasks = 2;
        epic_opts.task_type = Some(todo_model::TaskType::Epic);
        let epic_a = add(&handle, "epic a", epic_opts.clone()).unwrap().id;
        let epic_b = add(&handle, "epic b", epic_opts).unwrap().id;

        let mut opts_a = AddOptions::default();
        opts_a.max_active_tasks = 2;
        opts_a.parent_id = Some(epic_a.clone());
        let outside_task = add(&handle, "task outside the new scope", opts_a).unwrap().id;

        let mut opts_b = AddOptions::default();
        opts_b.max_active_tasks = 2;
        opts_b.parent_id = Some(epic_b.clone());
        let in_scope_task = add(&handle, "task inside the new scope", opts_b).unwrap().id;

        start(
            &paths,
            todo_lock::DEFAULT_TIMEOUT,
            &config,
            ScopeType::Epic,
            &epic_a,
            None,
            FocusChoice::Task(outside_task.clone()),
            StartOptions { allow_scope_overlap: true, ..Default::default() },
        )
        .unwrap();

        start(
            &paths,
            todo_lock::DEFAULT_TIMEOUT,
            &config,
            ScopeType::Epic,
            &epic_b,
            None,
            FocusChoice::Task(in_scope_task.clone()),
            StartOptions { allow_scope_overlap: true, ..Default::default() },
        )
        .unwrap();

        let active = handle.read_active().unwrap();
        assert_eq!(
            active.find(&outside_task).unwrap().status,
            Status::Pending,
            "starting a disjoint-scope session must demote a previously-active task globally"
        );
        assert_eq!(active.find(&in_scope_task).unwrap().status, Status::Active);
    }
}
