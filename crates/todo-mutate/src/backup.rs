//! Manual safety backups: a timestamped snapshot of every persistent file,
//! distinct from the automatic per-write operational backups rotated by
//! [`todo_store::backup::rotate`] (spec §4.2(c), §6).

use camino::Utf8PathBuf;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use todo_config::Config;
use todo_utils::error::TodoError;
use todo_utils::paths::StorePaths;

/// One manifest entry per file actually present at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupFileEntry {
    pub name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub timestamp: chrono::DateTime<Utc>,
    pub files: Vec<BackupFileEntry>,
    pub total_size_bytes: u64,
    pub validation_error_count: usize,
}

const SNAPSHOT_FILES: &[&str] = &["todo.json", "todo-archive.json", "config.json", "todo-log.jsonl", "sessions.json"];

/// Copy every persistent file that currently exists into a fresh
/// `backups/safety/<timestamp>/` directory alongside a `backup-metadata.json`
/// describing what was captured, then evict the oldest snapshots beyond
/// `backups.maxBackups` (0 = unlimited).
pub fn backup(paths: &StorePaths, config: &Config) -> Result<Utf8PathBuf, TodoError> {
    let snapshot_dir = paths.backups_safety_dir().join(Utc::now().format("%Y%m%d_%H%M%S_%f").to_string());
    fs::create_dir_all(snapshot_dir.as_std_path())?;

    let mut files = Vec::new();
    let mut total_size_bytes = 0u64;
    let state_dir = paths.state_dir();
    for name in SNAPSHOT_FILES {
        let source = state_dir.join(name);
        if !source.exists() {
            continue;
        }
        let dest = snapshot_dir.join(name);
        fs::copy(source.as_std_path(), dest.as_std_path())?;
        let size_bytes = fs::metadata(dest.as_std_path())?.len();
        total_size_bytes += size_bytes;
        files.push(BackupFileEntry { name: (*name).to_string(), size_bytes });
    }

    let active: todo_model::ActiveStore = todo_store::load_json(&paths.active_store())?.unwrap_or_else(|| {
        todo_model::ActiveStore {
            tasks: Vec::new(),
            project: todo_model::ProjectState::new("project".to_string()),
            focus: todo_model::Focus::default(),
            meta: todo_model::StoreMeta::new(todo_store::checksum::compute(b"[]"), Utc::now()),
        }
    });
    let archive: todo_model::ArchiveStore = todo_store::load_json(&paths.archive_store())?.unwrap_or_default();
    let validation_error_count = todo_validate::run(&active, &archive, config).error_count();

    let metadata = BackupMetadata { timestamp: Utc::now(), files, total_size_bytes, validation_error_count };
    todo_store::save_json_atomic(
        &snapshot_dir.join("backup-metadata.json"),
        &metadata,
        &todo_store::SaveOptions { backup_dir: None, max_backups: 0, lock_timeout: todo_lock::DEFAULT_TIMEOUT },
    )?;

    let max_backups = config.get_u64("backups.maxBackups").unwrap_or(5) as usize;
    if max_backups > 0 {
        evict_oldest(&paths.backups_safety_dir(), max_backups)?;
    }

    Ok(snapshot_dir)
}

fn evict_oldest(backups_dir: &Utf8PathBuf, max_backups: usize) -> Result<(), TodoError> {
    if !backups_dir.exists() {
        return Ok(());
    }
    let mut entries: Vec<(std::time::SystemTime, std::path::PathBuf)> = fs::read_dir(backups_dir.as_std_path())?
        .filter_map(Result::ok)
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            let mtime = e.metadata().ok()?.modified().ok()?;
            Some((mtime, e.path()))
        })
        .collect();

    if entries.len() <= max_backups {
        return Ok(());
    }
    entries.sort_by_key(|(mtime, _)| *mtime);
    let overflow = entries.len() - max_backups;
    for (_, path) in entries.into_iter().take(overflow) {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> (tempfile::TempDir, StorePaths) {
        let td = tempfile::TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join(".todo")).unwrap();
        (td, StorePaths::new(root))
    }

    fn config(paths: &StorePaths) -> Config {
        Config::load(paths.config_file(), StorePaths::global_config_file(), serde_json::json!({})).unwrap()
    }

    #[test]
    fn backup_snapshots_existing_files_and_writes_metadata() {
        let (_td, paths) = paths();
        std::fs::write(paths.active_store().as_std_path(), "[]").unwrap();
        let config = config(&paths);

        let snapshot_dir = backup(&paths, &config).unwrap();
        assert!(snapshot_dir.join("backup-metadata.json").exists());
        assert!(snapshot_dir.join("todo.json").exists());
        assert!(!snapshot_dir.join("todo-archive.json").exists());
    }

    #[test]
    fn backup_evicts_oldest_beyond_retention() {
        let (_td, paths) = paths();
        std::fs::write(paths.active_store().as_std_path(), "[]").unwrap();
        let mut config = config(&paths);
        config
            .set("backups.maxBackups", serde_json::json!(2), todo_config::ConfigSource::Project)
            .unwrap();

        for _ in 0..4 {
            backup(&paths, &config).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        let count = std::fs::read_dir(paths.backups_safety_dir().as_std_path()).unwrap().count();
        assert_eq!(count, 2);
    }
}
