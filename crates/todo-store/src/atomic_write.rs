//! Atomic file write: temp file in the same directory, fsync, then rename
//! over the target (spec §4.2(d)).

use camino::Utf8Path;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;
use todo_utils::error::TodoError;

/// Write `content` to `path` atomically. Creates the parent directory if
/// it does not exist. Normalizes line endings to LF.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<(), TodoError> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let mut temp_file = NamedTempFile::new_in(temp_dir)?;
    temp_file.write_all(normalized.as_bytes())?;
    temp_file.as_file().sync_all()?;
    temp_file
        .persist(path.as_std_path())
        .map_err(|e| TodoError::Io(e.error))?;
    Ok(())
}
