//! Session lifecycle operations (spec §4.8).

use chrono::Utc;
use std::time::Duration;
use todo_config::Config;
use todo_graph::TaskGraph;
use todo_model::{Focus, ScopeType, Session, SessionScope, SessionStatus, Status};
use todo_mutate::handle::audit_entry;
use todo_utils::error::TodoError;
use todo_utils::paths::StorePaths;

use crate::scope;
use crate::sessions_store::{self, SessionsFile};
use crate::txn;

/// Options accepted by [`start`].
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub agent: Option<String>,
    pub name: Option<String>,
    pub allow_scope_overlap: bool,
}

/// Either an explicit focus task id, or "auto-pick the highest-priority
/// pending task in scope".
#[derive(Debug, Clone)]
pub enum FocusChoice {
    Task(String),
    Auto,
}

/// Validate the scope, compute its task set, reject overlap unless
/// allowed, resolve the initial focus, and persist a new session plus its
/// binding file.
pub fn start(
    paths: &StorePaths,
    lock_timeout: Duration,
    config: &Config,
    scope_type: ScopeType,
    root_task_id: &str,
    phase: Option<String>,
    focus: FocusChoice,
    opts: StartOptions,
) -> Result<String, TodoError> {
    let multi_session = config.get_bool("multiSession.enabled").unwrap_or(false);
    let session_id = txn::mutate(paths, lock_timeout, |active, sessions| {
        let graph = TaskGraph::new(&active.tasks);
        let scope_ids = scope::task_ids(&graph, scope_type, root_task_id, phase.as_deref())?;

        if !opts.allow_scope_overlap {
            for open in sessions.open() {
                let other_graph = TaskGraph::new(&active.tasks);
                let other_ids =
                    scope::task_ids(&other_graph, open.scope.scope_type, &open.scope.root_task_id, open.scope.phase.as_deref())?;
                if scope::intersects(&scope_ids, &other_ids) {
                    return Err(TodoError::ScopeConflict { other: open.id.clone() });
                }
            }
        }

        let focus_task_id = match focus {
            FocusChoice::Task(id) => {
                if !scope_ids.contains(&id) {
                    return Err(TodoError::TaskNotInScope { id });
                }
                id
            }
            FocusChoice::Auto => {
                let mut candidates: Vec<_> = active
                    .tasks
                    .iter()
                    .filter(|t| scope_ids.contains(&t.id) && t.status == Status::Pending)
                    .collect();
                candidates.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
                candidates.first().map(|t| t.id.clone()).ok_or_else(|| TodoError::ScopeInvalid {
                    reason: "no pending task in scope to auto-focus".to_string(),
                })?
            }
        };

        let now = Utc::now();
        let session_id = todo_model::format_session_id(now, &format!("{:06x}", now.timestamp_subsec_micros()));

        demote_active_except(active, &focus_task_id, &scope_ids, multi_session);
        if let Some(task) = active.find_mut(&focus_task_id) {
            task.status = Status::Active;
            task.updated_at = Some(now);
        }
        active.focus.current_task = Some(focus_task_id.clone());

        let session = Session {
            id: session_id.clone(),
            status: SessionStatus::Active,
            scope: SessionScope { scope_type, root_task_id: root_task_id.to_string(), phase },
            focus: Focus { current_task: Some(focus_task_id), ..Default::default() },
            agent: opts.agent,
            name: opts.name,
            started_at: now,
            ended_at: None,
        };
        sessions.sessions.push(session);

        Ok(session_id)
    })?;

    sessions_store::write_binding(paths, &session_id)?;
    append_audit(paths, "session.start", Some(session_id.clone()))?;
    Ok(session_id)
}

/// Demotes every other active task. Scoped to `scope_ids` when
/// `multi_session` is true; global (spec's "otherwise" case) when false,
/// since that's the only mode reachable while multi-session is disabled.
fn demote_active_except(
    active: &mut todo_model::ActiveStore,
    keep: &str,
    scope_ids: &std::collections::BTreeSet<String>,
    multi_session: bool,
) {
    for task in &mut active.tasks {
        let in_scope = !multi_session || scope_ids.contains(&task.id);
        if task.status == Status::Active && task.id != keep && in_scope {
            task.status = Status::Pending;
            task.updated_at = Some(Utc::now());
        }
    }
}

/// Move to `ended` (resumable); preserves all state.
pub fn end(paths: &StorePaths, lock_timeout: Duration, session_id: &str, note: Option<String>) -> Result<(), TodoError> {
    set_status(paths, lock_timeout, session_id, SessionStatus::Ended, note)?;
    append_audit(paths, "session.end", Some(session_id.to_string()))
}

pub fn suspend(paths: &StorePaths, lock_timeout: Duration, session_id: &str) -> Result<(), TodoError> {
    set_status(paths, lock_timeout, session_id, SessionStatus::Suspended, None)?;
    append_audit(paths, "session.suspend", Some(session_id.to_string()))
}

pub fn resume(paths: &StorePaths, lock_timeout: Duration, session_id: &str) -> Result<(), TodoError> {
    set_status(paths, lock_timeout, session_id, SessionStatus::Active, None)?;
    append_audit(paths, "session.resume", Some(session_id.to_string()))
}

/// Requires every in-scope task to be `done`; otherwise `SessionCloseBlocked`.
pub fn close(paths: &StorePaths, lock_timeout: Duration, session_id: &str) -> Result<(), TodoError> {
    txn::mutate(paths, lock_timeout, |active, sessions| {
        let session = sessions.find(session_id).ok_or_else(|| TodoError::SessionNotFound { id: session_id.to_string() })?;
        let graph = TaskGraph::new(&active.tasks);
        let scope_ids = scope::task_ids(&graph, session.scope.scope_type, &session.scope.root_task_id, session.scope.phase.as_deref())?;
        let remaining = scope_ids.iter().filter(|id| active.find(id).is_some_and(|t| t.status != Status::Done)).count();
        if remaining > 0 {
            return Err(TodoError::SessionCloseBlocked { id: session_id.to_string(), remaining });
        }
        let session = sessions.find_mut(session_id).unwrap();
        session.status = SessionStatus::Closed;
        session.ended_at = Some(Utc::now());
        Ok(())
    })?;
    append_audit(paths, "session.close", Some(session_id.to_string()))
}

/// Repoint the binding file only; no state mutation.
pub fn switch(paths: &StorePaths, session_id: &str) -> Result<(), TodoError> {
    if sessions_store::load(paths)?.find(session_id).is_none() {
        return Err(TodoError::SessionNotFound { id: session_id.to_string() });
    }
    sessions_store::write_binding(paths, session_id)
}

pub fn list(paths: &StorePaths) -> Result<Vec<Session>, TodoError> {
    Ok(sessions_store::load(paths)?.sessions)
}

pub fn show(paths: &StorePaths, session_id: &str) -> Result<Session, TodoError> {
    sessions_store::load(paths)?
        .sessions
        .into_iter()
        .find(|s| s.id == session_id)
        .ok_or_else(|| TodoError::SessionNotFound { id: session_id.to_string() })
}

/// The session currently bound to this shell/process, if any.
pub fn status(paths: &StorePaths) -> Result<Option<Session>, TodoError> {
    let Some(id) = sessions_store::read_binding(paths)? else { return Ok(None) };
    Ok(sessions_store::load(paths)?.sessions.into_iter().find(|s| s.id == id))
}

fn set_status(
    paths: &StorePaths,
    lock_timeout: Duration,
    session_id: &str,
    target: SessionStatus,
    note: Option<String>,
) -> Result<(), TodoError> {
    txn::mutate_sessions(paths, lock_timeout, |sessions| {
        let session = sessions.find_mut(session_id).ok_or_else(|| TodoError::SessionNotFound { id: session_id.to_string() })?;
        session.status = target;
        if matches!(target, SessionStatus::Ended | SessionStatus::Closed) {
            session.ended_at = Some(Utc::now());
        }
        if let Some(text) = note {
            session.focus.session_note = Some(text);
        }
        Ok(())
    })
}

fn append_audit(paths: &StorePaths, action: &str, session_id: Option<String>) -> Result<(), TodoError> {
    let mut entry = audit_entry(action, None);
    entry.session_id = session_id;
    todo_store::audit::AuditLog::new(paths.audit_log()).append(&entry)
}
