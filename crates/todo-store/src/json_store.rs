//! `loadJson`/`saveJson` contract (spec §4.2).

use camino::Utf8PathBuf;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use todo_utils::error::TodoError;

use crate::atomic_write::write_file_atomic;
use crate::backup;

/// Options controlling a [`save_json_atomic`] call.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Directory backups are rotated into. `None` disables backups.
    pub backup_dir: Option<Utf8PathBuf>,
    /// Maximum backups retained (`0` = unlimited). Ignored if `backup_dir`
    /// is `None`.
    pub max_backups: usize,
    /// Timeout for the advisory file lock.
    pub lock_timeout: Duration,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            backup_dir: None,
            max_backups: 10,
            lock_timeout: todo_lock::DEFAULT_TIMEOUT,
        }
    }
}

/// Load and deserialize JSON from `path`. Returns `Ok(None)` if the file
/// does not exist.
pub fn load_json<T: DeserializeOwned>(path: &Utf8PathBuf) -> Result<Option<T>, TodoError> {
    if !path.exists() {
        return Ok(None);
    }
    let lock_path = sibling_lock_path(path);
    let _guard = todo_lock::acquire(&lock_path, todo_lock::DEFAULT_TIMEOUT)?;
    let content = std::fs::read_to_string(path.as_std_path())?;
    let value = serde_json::from_str(&content)
        .map_err(|e| TodoError::SchemaInvalid { reason: e.to_string() })?;
    Ok(Some(value))
}

/// Lock, optionally back up the existing file, then atomically write `value`
/// as JSON to `path` (spec §4.2 steps a-f, minus checksum embedding which is
/// the caller's responsibility since it is domain-specific).
pub fn save_json_atomic<T: Serialize>(
    path: &Utf8PathBuf,
    value: &T,
    opts: &SaveOptions,
) -> Result<(), TodoError> {
    let lock_path = sibling_lock_path(path);
    let _guard = todo_lock::acquire(&lock_path, opts.lock_timeout)?;

    if let Some(backup_dir) = &opts.backup_dir {
        backup::rotate(path, backup_dir, opts.max_backups)?;
    }

    let json = serde_json::to_string_pretty(value)?;
    write_file_atomic(path, &json)?;
    Ok(())
}

pub(crate) fn sibling_lock_path(path: &Utf8PathBuf) -> Utf8PathBuf {
    let file_name = path.file_name().unwrap_or("store");
    path.with_file_name(format!(".{file_name}.lock"))
}
