//! Two-file transactions spanning the active store and the sessions
//! registry. Lock order is fixed project-wide as active < archive <
//! sessions < config, matching [`todo_mutate::handle::StoreHandle`]'s
//! active-before-archive order, so no two call sites can deadlock against
//! each other by acquiring the same two locks in opposite order.

use chrono::Utc;
use std::time::Duration;
use todo_model::{ActiveStore, Focus, ProjectState, StoreMeta};
use todo_store::{SaveOptions, StoreTransaction, checksum};
use todo_utils::error::TodoError;
use todo_utils::paths::StorePaths;

use crate::sessions_store::SessionsFile;

fn default_active(paths: &StorePaths) -> ActiveStore {
    let name = paths.state_dir().parent().map(|p| p.to_string()).unwrap_or_else(|| "project".to_string());
    ActiveStore {
        tasks: Vec::new(),
        project: ProjectState::new(name),
        focus: Focus::default(),
        meta: StoreMeta::new(checksum::compute(b"[]"), Utc::now()),
    }
}

fn save_opts(paths: &StorePaths, lock_timeout: Duration) -> SaveOptions {
    SaveOptions { backup_dir: Some(paths.backups_operational_dir()), max_backups: 10, lock_timeout }
}

/// Run `f` against the sessions registry alone under one held lock,
/// persisting only if `f` succeeds.
pub fn mutate_sessions<T>(
    paths: &StorePaths,
    lock_timeout: Duration,
    f: impl FnOnce(&mut SessionsFile) -> Result<T, TodoError>,
) -> Result<T, TodoError> {
    let txn = StoreTransaction::begin(&paths.sessions_file(), lock_timeout)?;
    let mut sessions: SessionsFile = txn.load(&paths.sessions_file())?.unwrap_or_default();
    let result = f(&mut sessions)?;
    txn.save(&paths.sessions_file(), &sessions, &save_opts(paths, lock_timeout))?;
    Ok(result)
}

/// Run `f` against the active store and the sessions registry under locks
/// held for the whole sequence, persisting both only if `f` succeeds.
pub fn mutate<T>(
    paths: &StorePaths,
    lock_timeout: Duration,
    f: impl FnOnce(&mut ActiveStore, &mut SessionsFile) -> Result<T, TodoError>,
) -> Result<T, TodoError> {
    let active_txn = StoreTransaction::begin(&paths.active_store(), lock_timeout)?;
    let sessions_txn = StoreTransaction::begin(&paths.sessions_file(), lock_timeout)?;

    let mut active: ActiveStore = active_txn.load(&paths.active_store())?.unwrap_or_else(|| default_active(paths));
    let mut sessions: SessionsFile = sessions_txn.load(&paths.sessions_file())?.unwrap_or_default();

    let result = f(&mut active, &mut sessions)?;

    active.meta.checksum = checksum::compute_of(&active.tasks)?;
    active.meta.last_modified = Utc::now();
    active_txn.save(&paths.active_store(), &active, &save_opts(paths, lock_timeout))?;
    sessions_txn.save(&paths.sessions_file(), &sessions, &save_opts(paths, lock_timeout))?;
    Ok(result)
}
