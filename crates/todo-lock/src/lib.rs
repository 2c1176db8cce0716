//! Advisory, per-path file locking with a bounded acquisition timeout
//! (spec §4.2, §5).
//!
//! Each persistent file gets its own `.lock` sidecar. Locks are scoped with
//! RAII: every exit path (return, `?`, panic-unwind) releases the
//! underlying `fd_lock::RwLock` guard when [`FileGuard`] drops.

use camino::Utf8PathBuf;
use fd_lock::RwLock;
use std::fs::{self, File, OpenOptions};
use std::time::{Duration, Instant};
use todo_utils::error::TodoError;

/// Default lock acquisition timeout (spec §5: "~5 seconds").
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between retry attempts while waiting for the lock to free up.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A held advisory lock on a single file path. Releases on `Drop`.
pub struct FileGuard {
    _lock: RwLock<File>,
    path: Utf8PathBuf,
}

impl FileGuard {
    #[must_use]
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }
}

/// Acquire an advisory exclusive lock on `lock_path`, retrying until
/// `timeout` elapses.
///
/// Creates `lock_path` (and its parent directory) if it does not exist.
/// Returns [`TodoError::LockTimeout`] if the lock could not be acquired
/// within the timeout.
pub fn acquire(lock_path: &Utf8PathBuf, timeout: Duration) -> Result<FileGuard, TodoError> {
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path.as_std_path())?;

    let mut rw = RwLock::new(file);
    let deadline = Instant::now() + timeout;

    loop {
        match rw.try_write() {
            Ok(guard) => {
                // Drop the short-lived guard; the RwLock itself is moved into
                // FileGuard and held for the lifetime of the returned value,
                // which keeps the OS-level lock in effect.
                drop(guard);
                return Ok(FileGuard {
                    _lock: rw,
                    path: lock_path.clone(),
                });
            }
            Err(_) => {
                if Instant::now() >= deadline {
                    return Err(TodoError::LockTimeout {
                        path: lock_path.to_string(),
                    });
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_creates_lock_file_and_parent_dir() {
        let td = tempfile::TempDir::new().unwrap();
        let lock_path = Utf8PathBuf::from_path_buf(td.path().join("nested").join(".x.lock")).unwrap();
        let guard = acquire(&lock_path, Duration::from_secs(1)).unwrap();
        assert!(lock_path.exists());
        assert_eq!(guard.path(), &lock_path);
    }

    #[test]
    fn second_acquire_times_out_while_first_is_held() {
        let td = tempfile::TempDir::new().unwrap();
        let lock_path = Utf8PathBuf::from_path_buf(td.path().join(".x.lock")).unwrap();
        let _first = acquire(&lock_path, Duration::from_secs(1)).unwrap();

        let second = acquire(&lock_path, Duration::from_millis(100));
        assert!(matches!(second, Err(TodoError::LockTimeout { .. })));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let td = tempfile::TempDir::new().unwrap();
        let lock_path = Utf8PathBuf::from_path_buf(td.path().join(".x.lock")).unwrap();
        {
            let _first = acquire(&lock_path, Duration::from_secs(1)).unwrap();
        }
        let second = acquire(&lock_path, Duration::from_millis(200));
        assert!(second.is_ok());
    }
}
