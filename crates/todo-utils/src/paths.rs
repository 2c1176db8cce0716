//! Project root discovery and canonical file paths (spec §4.1, §6).
//!
//! Given a starting directory, [`project_root`] walks upward looking for an
//! existing `.todo/` state directory; if none is found anywhere up to the
//! filesystem root, the starting directory itself is used (a fresh project).

use camino::Utf8PathBuf;
use std::cell::RefCell;

/// Name of the project-state directory, relative to the project root.
pub const STATE_DIR_NAME: &str = ".todo";

// Thread-local override used only in tests to avoid process-global env/cwd races.
thread_local! {
    static THREAD_ROOT: RefCell<Option<Utf8PathBuf>> = const { RefCell::new(None) };
}

/// Resolve the project root starting from `start`.
///
/// Walks upward looking for a `.todo/` directory. Falls back to `start`
/// itself if none exists up to the filesystem root (a not-yet-initialized
/// project).
#[must_use]
pub fn project_root(start: &Utf8PathBuf) -> Utf8PathBuf {
    if let Some(tl) = THREAD_ROOT.with(|tl| tl.borrow().clone()) {
        return tl;
    }
    let mut current = start.clone();
    loop {
        if current.join(STATE_DIR_NAME).is_dir() {
            return current;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return start.clone(),
        }
    }
}

/// Returns `<project_root>/.todo`.
#[must_use]
pub fn state_dir(root: &Utf8PathBuf) -> Utf8PathBuf {
    root.join(STATE_DIR_NAME)
}

/// Canonical paths for every persistent file owned by the core (spec §6).
#[derive(Debug, Clone)]
pub struct StorePaths {
    root: Utf8PathBuf,
}

impl StorePaths {
    #[must_use]
    pub fn new(project_root: Utf8PathBuf) -> Self {
        Self { root: project_root }
    }

    #[must_use]
    pub fn state_dir(&self) -> Utf8PathBuf {
        state_dir(&self.root)
    }

    #[must_use]
    pub fn active_store(&self) -> Utf8PathBuf {
        self.state_dir().join("todo.json")
    }

    #[must_use]
    pub fn archive_store(&self) -> Utf8PathBuf {
        self.state_dir().join("todo-archive.json")
    }

    #[must_use]
    pub fn config_file(&self) -> Utf8PathBuf {
        self.state_dir().join("config.json")
    }

    #[must_use]
    pub fn audit_log(&self) -> Utf8PathBuf {
        self.state_dir().join("todo-log.jsonl")
    }

    #[must_use]
    pub fn sequence_file(&self) -> Utf8PathBuf {
        self.state_dir().join(".sequence")
    }

    #[must_use]
    pub fn sessions_file(&self) -> Utf8PathBuf {
        self.state_dir().join("sessions.json")
    }

    #[must_use]
    pub fn current_session_binding(&self) -> Utf8PathBuf {
        self.state_dir().join(".current-session")
    }

    #[must_use]
    pub fn backups_operational_dir(&self) -> Utf8PathBuf {
        self.state_dir().join("backups").join("operational")
    }

    #[must_use]
    pub fn backups_safety_dir(&self) -> Utf8PathBuf {
        self.state_dir().join("backups").join("safety")
    }

    #[must_use]
    pub fn global_config_file() -> Utf8PathBuf {
        dirs_home().join(".todo").join("config.json")
    }

    #[must_use]
    pub fn rcsd_manifest(&self, epic_id: &str) -> Utf8PathBuf {
        self.state_dir().join("rcsd").join(epic_id).join("_manifest.json")
    }

    #[must_use]
    pub fn lock_path(&self, target: &Utf8PathBuf) -> Utf8PathBuf {
        let file_name = target.file_name().unwrap_or("store");
        self.state_dir().join(format!(".{file_name}.lock"))
    }
}

fn dirs_home() -> Utf8PathBuf {
    std::env::var("HOME")
        .ok()
        .or_else(|| std::env::var("USERPROFILE").ok())
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

/// mkdir -p; treats `AlreadyExists` as success (removes a TOCTTOU race).
pub fn ensure_dir_all(p: &Utf8PathBuf) -> std::io::Result<()> {
    match std::fs::create_dir_all(p) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// RAII guard for an isolated project root, for tests only.
#[cfg(any(test, feature = "test-utils"))]
pub struct RootGuard {
    inner: tempfile::TempDir,
}

#[cfg(any(test, feature = "test-utils"))]
impl Drop for RootGuard {
    fn drop(&mut self) {
        THREAD_ROOT.with(|tl| *tl.borrow_mut() = None);
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl std::ops::Deref for RootGuard {
    type Target = tempfile::TempDir;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Test helper: give a test an isolated project root under the system temp
/// dir for the duration of the returned guard.
#[cfg(any(test, feature = "test-utils"))]
#[must_use]
pub fn with_isolated_root() -> RootGuard {
    let td = tempfile::TempDir::new().expect("create temp root");
    let p = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
    THREAD_ROOT.with(|tl| *tl.borrow_mut() = Some(p));
    RootGuard { inner: td }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_root_falls_back_to_start_when_no_state_dir() {
        let td = tempfile::TempDir::new().unwrap();
        let start = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        assert_eq!(project_root(&start), start);
    }

    #[test]
    fn project_root_walks_up_to_find_state_dir() {
        let td = tempfile::TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join(STATE_DIR_NAME)).unwrap();
        let nested = root.join("a").join("b").join("c");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(project_root(&nested), root);
    }

    #[test]
    fn store_paths_are_canonical() {
        let root = Utf8PathBuf::from("/proj");
        let paths = StorePaths::new(root);
        assert_eq!(paths.active_store(), Utf8PathBuf::from("/proj/.todo/todo.json"));
        assert_eq!(
            paths.archive_store(),
            Utf8PathBuf::from("/proj/.todo/todo-archive.json")
        );
        assert_eq!(
            paths.sequence_file(),
            Utf8PathBuf::from("/proj/.todo/.sequence")
        );
    }
}
