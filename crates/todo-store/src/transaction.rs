//! A single lock held across an entire read-modify-write transaction
//! (spec §4.7: "lock → read → validate → mutate → validate → write →
//! log"). `load_json`/`save_json_atomic` each acquire and release their
//! own lock, which is correct for one-shot reads/writes but would
//! re-enter the same advisory lock (and block forever) if used inside
//! an already-locked mutator. `StoreTransaction` holds one guard for the
//! whole sequence instead.

use camino::Utf8PathBuf;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use todo_lock::FileGuard;
use todo_utils::error::TodoError;

use crate::atomic_write::write_file_atomic;
use crate::backup;
use crate::json_store::SaveOptions;

/// An open transaction holding the advisory lock for `path` for as long
/// as this value lives.
pub struct StoreTransaction {
    _guard: FileGuard,
}

impl StoreTransaction {
    /// Acquire the lock for `path` and begin a transaction.
    pub fn begin(path: &Utf8PathBuf, timeout: Duration) -> Result<Self, TodoError> {
        let lock_path = crate::json_store::sibling_lock_path(path);
        let guard = todo_lock::acquire(&lock_path, timeout)?;
        Ok(Self { _guard: guard })
    }

    /// Read and deserialize `path` without taking a further lock. Returns
    /// `Ok(None)` if the file does not exist.
    pub fn load<T: DeserializeOwned>(&self, path: &Utf8PathBuf) -> Result<Option<T>, TodoError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path.as_std_path())?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| TodoError::SchemaInvalid { reason: e.to_string() })
    }

    /// Back up and atomically write `value` to `path` without taking a
    /// further lock.
    pub fn save<T: Serialize>(&self, path: &Utf8PathBuf, value: &T, opts: &SaveOptions) -> Result<(), TodoError> {
        if let Some(backup_dir) = &opts.backup_dir {
            backup::rotate(path, backup_dir, opts.max_backups)?;
        }
        let json = serde_json::to_string_pretty(value)?;
        write_file_atomic(path, &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        value: u32,
    }

    #[test]
    fn load_then_save_within_one_lock() {
        let td = tempfile::TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(td.path().join("doc.json")).unwrap();

        let txn = StoreTransaction::begin(&path, Duration::from_secs(1)).unwrap();
        let loaded: Option<Doc> = txn.load(&path).unwrap();
        assert!(loaded.is_none());
        txn.save(&path, &Doc { value: 7 }, &SaveOptions::default()).unwrap();
        drop(txn);

        let txn2 = StoreTransaction::begin(&path, Duration::from_secs(1)).unwrap();
        let loaded: Option<Doc> = txn2.load(&path).unwrap();
        assert_eq!(loaded, Some(Doc { value: 7 }));
    }
}
