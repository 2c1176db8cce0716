//! Backup rotation for the atomic store (spec §4.2(c)).
//!
//! Before each write, the previous on-disk contents are copied into
//! `backup_dir` with a timestamped name; the oldest backups beyond
//! `max_backups` are evicted by mtime. `max_backups == 0` means unlimited.

use camino::Utf8Path;
use chrono::Utc;
use std::fs;
use todo_utils::error::TodoError;

/// Snapshot `source` into `backup_dir`, then evict the oldest backups for
/// this source's stem beyond `max_backups`.
pub fn rotate(source: &Utf8Path, backup_dir: &Utf8Path, max_backups: usize) -> Result<(), TodoError> {
    if !source.exists() {
        return Ok(());
    }
    fs::create_dir_all(backup_dir.as_std_path())?;

    let stem = source.file_stem().unwrap_or("store");
    let ext = source.extension().unwrap_or("json");
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S_%f");
    let backup_name = format!("{stem}-{timestamp}.{ext}");
    let backup_path = backup_dir.join(backup_name);

    fs::copy(source.as_std_path(), backup_path.as_std_path())?;

    if max_backups > 0 {
        evict_oldest(backup_dir, stem, max_backups)?;
    }
    Ok(())
}

fn evict_oldest(backup_dir: &Utf8Path, stem: &str, max_backups: usize) -> Result<(), TodoError> {
    let mut entries: Vec<(std::time::SystemTime, std::path::PathBuf)> = fs::read_dir(backup_dir.as_std_path())?
        .filter_map(Result::ok)
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(stem))
        })
        .filter_map(|e| {
            let meta = e.metadata().ok()?;
            let mtime = meta.modified().ok()?;
            Some((mtime, e.path()))
        })
        .collect();

    if entries.len() <= max_backups {
        return Ok(());
    }

    entries.sort_by_key(|(mtime, _)| *mtime);
    let overflow = entries.len() - max_backups;
    for (_, path) in entries.into_iter().take(overflow) {
        fs::remove_file(path)?;
    }
    Ok(())
}
