//! Append-only audit log (spec §3, §4.2): line-delimited JSON, one entry
//! per line, rotated by size.

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use todo_utils::error::TodoError;

/// Default rotation threshold in bytes (10 MiB).
pub const DEFAULT_ROTATE_THRESHOLD_BYTES: u64 = 10 * 1024 * 1024;

/// One audit-log entry (spec §3 "Audit log").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub action: String,
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Handle to the audit log file at `path`.
pub struct AuditLog {
    path: Utf8PathBuf,
    rotate_threshold_bytes: u64,
}

impl AuditLog {
    #[must_use]
    pub fn new(path: Utf8PathBuf) -> Self {
        Self {
            path,
            rotate_threshold_bytes: DEFAULT_ROTATE_THRESHOLD_BYTES,
        }
    }

    #[must_use]
    pub fn with_rotate_threshold(mut self, bytes: u64) -> Self {
        self.rotate_threshold_bytes = bytes;
        self
    }

    /// Append `entry` as one JSON line, under the lock for this file.
    /// Rotates the current file to `log-<timestamp>.jsonl` first if it
    /// would exceed the configured threshold.
    pub fn append(&self, entry: &AuditEntry) -> Result<(), TodoError> {
        let lock_path = self.path.with_file_name(format!(
            ".{}.lock",
            self.path.file_name().unwrap_or("log")
        ));
        let _guard = todo_lock::acquire(&lock_path, todo_lock::DEFAULT_TIMEOUT)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        self.rotate_if_needed()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_std_path())?;
        let line = serde_json::to_string(entry)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Read all entries currently on disk (oldest first). Corrupt lines
    /// are skipped rather than failing the whole read.
    pub fn read_all(&self) -> Result<Vec<AuditEntry>, TodoError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(self.path.as_std_path())?;
        Ok(content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect())
    }

    fn rotate_if_needed(&self) -> Result<(), TodoError> {
        let Ok(meta) = std::fs::metadata(self.path.as_std_path()) else {
            return Ok(());
        };
        if meta.len() < self.rotate_threshold_bytes {
            return Ok(());
        }
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let rotated = self
            .path
            .with_file_name(format!("log-{timestamp}.jsonl"));
        std::fs::rename(self.path.as_std_path(), rotated.as_std_path())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(action: &str) -> AuditEntry {
        AuditEntry {
            id: uuid_like(),
            timestamp: Utc::now(),
            session_id: None,
            action: action.to_string(),
            actor: "test".to_string(),
            task_id: None,
            before: None,
            after: None,
            details: None,
        }
    }

    fn uuid_like() -> String {
        format!("{:x}", Utc::now().timestamp_nanos_opt().unwrap_or(0))
    }

    #[test]
    fn append_and_read_round_trips() {
        let td = tempfile::TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(td.path().join("log.jsonl")).unwrap();
        let log = AuditLog::new(path);
        log.append(&entry("task.add")).unwrap();
        log.append(&entry("task.complete")).unwrap();
        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "task.add");
        assert_eq!(entries[1].action, "task.complete");
    }

    #[test]
    fn rotates_when_over_threshold() {
        let td = tempfile::TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(td.path().join("log.jsonl")).unwrap();
        let log = AuditLog::new(path.clone()).with_rotate_threshold(1);
        log.append(&entry("first")).unwrap();
        log.append(&entry("second")).unwrap();

        // Original file was rotated away and replaced with a fresh one
        // containing only the entry written after rotation.
        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "second");
    }
}
