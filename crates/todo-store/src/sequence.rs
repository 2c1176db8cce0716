//! Monotonic task-id counter, persisted across sessions (spec §4.3).

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use todo_utils::error::TodoError;
use todo_utils::ids::format_id;

use crate::checksum;
use crate::json_store::{SaveOptions, load_json, save_json_atomic};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SequenceFile {
    counter: u64,
    checksum: String,
}

impl SequenceFile {
    fn new(counter: u64) -> Self {
        Self {
            checksum: checksum::compute(counter.to_string().as_bytes()),
            counter,
        }
    }
}

/// Result of [`SequenceAllocator::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStatus {
    Ok,
    Drift { counter: u64, max_id: u64 },
}

/// The sequence allocator owns a single `.sequence` file.
pub struct SequenceAllocator {
    path: Utf8PathBuf,
}

impl SequenceAllocator {
    #[must_use]
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<SequenceFile, TodoError> {
        Ok(load_json(&self.path)?.unwrap_or(SequenceFile::new(1)))
    }

    fn save(&self, file: &SequenceFile) -> Result<(), TodoError> {
        save_json_atomic(&self.path, file, &SaveOptions::default())
    }

    /// Allocate the next canonical task id, incrementing and persisting the
    /// counter atomically. Note: the field is named "checksum" for
    /// compatibility with the on-disk schema but per spec §9 it is not
    /// relied upon for drift detection — `check`/`repair` always reconcile
    /// against `max(id across stores)+1`.
    pub fn next(&self) -> Result<String, TodoError> {
        let current = self.load()?;
        let id = format_id(current.counter);
        self.save(&SequenceFile::new(current.counter + 1))?;
        Ok(id)
    }

    /// Check whether the persisted counter is still valid given the
    /// current maximum id across active and archive stores.
    pub fn check(&self, max_id: u64) -> Result<SequenceStatus, TodoError> {
        let current = self.load()?;
        if current.counter <= max_id {
            Ok(SequenceStatus::Drift {
                counter: current.counter,
                max_id,
            })
        } else {
            Ok(SequenceStatus::Ok)
        }
    }

    /// Reset the counter to `max_id + 1`.
    pub fn repair(&self, max_id: u64) -> Result<u64, TodoError> {
        let new_counter = max_id + 1;
        self.save(&SequenceFile::new(new_counter))?;
        Ok(new_counter)
    }
}
