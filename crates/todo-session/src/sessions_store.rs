//! `sessions.json`: the multi-session registry, plus the `.current-session`
//! binding file that records which session the current shell is bound to
//! (spec §4.8).

use serde::{Deserialize, Serialize};
use todo_model::Session;
use todo_utils::error::TodoError;
use todo_utils::paths::StorePaths;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionsFile {
    pub sessions: Vec<Session>,
}

impl SessionsFile {
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Every session currently `active` or `suspended`.
    pub fn open(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter().filter(|s| s.is_open())
    }
}

pub fn load(paths: &StorePaths) -> Result<SessionsFile, TodoError> {
    Ok(todo_store::load_json(&paths.sessions_file())?.unwrap_or_default())
}

pub fn save(paths: &StorePaths, file: &SessionsFile) -> Result<(), TodoError> {
    todo_store::save_json_atomic(
        &paths.sessions_file(),
        file,
        &todo_store::SaveOptions {
            backup_dir: Some(paths.backups_operational_dir()),
            max_backups: 10,
            lock_timeout: todo_lock::DEFAULT_TIMEOUT,
        },
    )
}

/// Read the bound session id, if any (empty/missing file means unbound).
pub fn read_binding(paths: &StorePaths) -> Result<Option<String>, TodoError> {
    let path = paths.current_session_binding();
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path.as_std_path())?;
    let trimmed = contents.trim();
    Ok(if trimmed.is_empty() { None } else { Some(trimmed.to_string()) })
}

/// Point the binding file at `session_id`.
pub fn write_binding(paths: &StorePaths, session_id: &str) -> Result<(), TodoError> {
    todo_utils::paths::ensure_dir_all(&paths.state_dir())?;
    std::fs::write(paths.current_session_binding().as_std_path(), session_id)?;
    Ok(())
}

/// Remove the binding file entirely (no session bound).
pub fn clear_binding(paths: &StorePaths) -> Result<(), TodoError> {
    let path = paths.current_session_binding();
    if path.exists() {
        std::fs::remove_file(path.as_std_path())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn paths() -> (tempfile::TempDir, StorePaths) {
        let td = tempfile::TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join(".todo")).unwrap();
        (td, StorePaths::new(root))
    }

    #[test]
    fn binding_round_trips() {
        let (_td, paths) = paths();
        assert_eq!(read_binding(&paths).unwrap(), None);
        write_binding(&paths, "session_x").unwrap();
        assert_eq!(read_binding(&paths).unwrap(), Some("session_x".to_string()));
        clear_binding(&paths).unwrap();
        assert_eq!(read_binding(&paths).unwrap(), None);
    }
}
