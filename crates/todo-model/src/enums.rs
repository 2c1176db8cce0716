//! Closed enumerations used throughout the domain model (spec §3).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    Pending,
    Active,
    Blocked,
    Done,
    Cancelled,
}

/// Task priority, used both for the single-active cap and leverage scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Weight used by the leverage formula (spec §4.10).
    #[must_use]
    pub fn score(self) -> u32 {
        match self {
            Self::Critical => 100,
            Self::High => 75,
            Self::Medium => 50,
            Self::Low => 25,
        }
    }
}

/// Position of a task in the parent/child tree (spec §3, max depth 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskType {
    Epic,
    Task,
    Subtask,
}

/// Scope size. Never a time estimate (the domain forbids those).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Size {
    Small,
    Medium,
    Large,
}

/// Typed cross-reference kind for `Task::relates` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RelationType {
    RelatesTo,
    SpawnedFrom,
    DeferredTo,
    Supersedes,
    Duplicates,
}
