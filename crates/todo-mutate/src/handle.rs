//! The façade mutators are built on: canonical paths, lock timeout, and
//! the shared load/save/audit plumbing (spec §4.7: "lock → read →
//! validate → mutate → validate → write → log").

use chrono::Utc;
use std::time::Duration;
use todo_model::{ActiveStore, ArchiveStore, Focus, ProjectState, StoreMeta};
use todo_store::{SaveOptions, StoreTransaction, checksum, load_json};
use todo_utils::error::TodoError;
use todo_utils::paths::StorePaths;

/// Owns the canonical paths for one project and the lock timeout every
/// mutator should honor. Cheap to construct; stateless otherwise.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    pub paths: StorePaths,
    pub lock_timeout: Duration,
}

impl StoreHandle {
    #[must_use]
    pub fn new(paths: StorePaths) -> Self {
        Self { paths, lock_timeout: todo_lock::DEFAULT_TIMEOUT }
    }

    fn save_opts(&self) -> SaveOptions {
        SaveOptions {
            backup_dir: Some(self.paths.backups_operational_dir()),
            max_backups: 10,
            lock_timeout: self.lock_timeout,
        }
    }

    /// Read-only snapshot of the active store, for callers that do not
    /// intend to mutate (analysis, listing).
    pub fn read_active(&self) -> Result<ActiveStore, TodoError> {
        Ok(load_json(&self.paths.active_store())?.unwrap_or_else(|| default_active(&self.paths)))
    }

    /// Read-only snapshot of the archive store.
    pub fn read_archive(&self) -> Result<ArchiveStore, TodoError> {
        Ok(load_json(&self.paths.archive_store())?.unwrap_or_default())
    }

    /// Run `f` against the active store under a single lock held for the
    /// whole read-modify-write sequence, persisting the result (and
    /// refreshing checksum/lastModified) only if `f` succeeds.
    pub fn mutate_active<T>(
        &self,
        f: impl FnOnce(&mut ActiveStore, &ArchiveStore) -> Result<T, TodoError>,
    ) -> Result<T, TodoError> {
        let txn = StoreTransaction::begin(&self.paths.active_store(), self.lock_timeout)?;
        let mut active: ActiveStore =
            txn.load(&self.paths.active_store())?.unwrap_or_else(|| default_active(&self.paths));
        let archive = self.read_archive()?;

        let result = f(&mut active, &archive)?;

        active.meta.checksum = checksum::compute_of(&active.tasks)?;
        active.meta.last_modified = Utc::now();
        txn.save(&self.paths.active_store(), &active, &self.save_opts())?;
        Ok(result)
    }

    /// Run `f` against both stores under locks held for the whole
    /// sequence (active locked before archive, a fixed order that avoids
    /// deadlock against any other mutator taking the same two locks).
    pub fn mutate_both<T>(
        &self,
        f: impl FnOnce(&mut ActiveStore, &mut ArchiveStore) -> Result<T, TodoError>,
    ) -> Result<T, TodoError> {
        let active_txn = StoreTransaction::begin(&self.paths.active_store(), self.lock_timeout)?;
        let archive_txn = StoreTransaction::begin(&self.paths.archive_store(), self.lock_timeout)?;

        let mut active: ActiveStore =
            active_txn.load(&self.paths.active_store())?.unwrap_or_else(|| default_active(&self.paths));
        let mut archive: ArchiveStore = archive_txn.load(&self.paths.archive_store())?.unwrap_or_default();

        let result = f(&mut active, &mut archive)?;

        active.meta.checksum = checksum::compute_of(&active.tasks)?;
        active.meta.last_modified = Utc::now();
        active_txn.save(&self.paths.active_store(), &active, &self.save_opts())?;
        archive_txn.save(&self.paths.archive_store(), &archive, &self.save_opts())?;
        Ok(result)
    }

    pub fn append_audit(&self, entry: todo_store::audit::AuditEntry) -> Result<(), TodoError> {
        todo_store::audit::AuditLog::new(self.paths.audit_log()).append(&entry)
    }
}

fn default_active(paths: &StorePaths) -> ActiveStore {
    let name = paths.state_dir().parent().map(|p| p.to_string()).unwrap_or_else(|| "project".to_string());
    ActiveStore {
        tasks: Vec::new(),
        project: ProjectState::new(name),
        focus: Focus::default(),
        meta: StoreMeta::new(checksum::compute(b"[]"), Utc::now()),
    }
}

/// Build an audit entry with the fields every mutator needs; `id`/`before`/
/// `after`/`details` are filled in by the caller.
#[must_use]
pub fn audit_entry(action: &str, task_id: Option<String>) -> todo_store::audit::AuditEntry {
    todo_store::audit::AuditEntry {
        id: format!("audit-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default()),
        timestamp: Utc::now(),
        session_id: None,
        action: action.to_string(),
        actor: "core".to_string(),
        task_id,
        before: None,
        after: None,
        details: None,
    }
}
