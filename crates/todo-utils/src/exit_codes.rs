//! Exit code constants and error → exit-code mapping (spec §6).
//!
//! These values are part of the core's stable public contract and are
//! shared by every external collaborator that shells out to the CLI.

use crate::error::TodoError;

/// Type-safe exit code. The numeric values are stable across 1.x releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const INVALID_INPUT: ExitCode = ExitCode(2);
    pub const FILE_OPERATION_FAILURE: ExitCode = ExitCode(3);
    pub const NOT_FOUND: ExitCode = ExitCode(4);
    pub const MISSING_DEPENDENCY: ExitCode = ExitCode(5);
    pub const VALIDATION_ERROR: ExitCode = ExitCode(6);
    pub const LOCK_TIMEOUT: ExitCode = ExitCode(7);
    pub const CONFIG_ERROR: ExitCode = ExitCode(8);
    pub const PARENT_NOT_FOUND: ExitCode = ExitCode(10);
    pub const MAX_DEPTH_EXCEEDED: ExitCode = ExitCode(11);
    pub const MAX_SIBLINGS_EXCEEDED: ExitCode = ExitCode(12);
    pub const INVALID_PARENT_TYPE: ExitCode = ExitCode(13);
    pub const CHECKSUM_MISMATCH: ExitCode = ExitCode(20);
    pub const SEQUENCE_DRIFT: ExitCode = ExitCode(22);
    pub const SESSION_EXISTS: ExitCode = ExitCode(30);
    pub const SESSION_NOT_FOUND: ExitCode = ExitCode(31);
    pub const SCOPE_CONFLICT: ExitCode = ExitCode(32);
    pub const SCOPE_INVALID: ExitCode = ExitCode(33);
    pub const TASK_NOT_IN_SCOPE: ExitCode = ExitCode(34);
    pub const TASK_CLAIMED: ExitCode = ExitCode(35);
    pub const SESSION_REQUIRED: ExitCode = ExitCode(36);
    pub const SESSION_CLOSE_BLOCKED: ExitCode = ExitCode(37);
    pub const FOCUS_REQUIRED: ExitCode = ExitCode(38);
    pub const LIFECYCLE_GATE_FAILED: ExitCode = ExitCode(75);
    pub const ALREADY_INITIALIZED: ExitCode = ExitCode(101);
    pub const NO_CHANGE: ExitCode = ExitCode(102);
    pub const INTERNAL: ExitCode = ExitCode(1);

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<ExitCode> for i32 {
    fn from(value: ExitCode) -> Self {
        value.0
    }
}

impl From<&TodoError> for ExitCode {
    fn from(error: &TodoError) -> Self {
        use TodoError as E;
        match error {
            E::InvalidInput { .. }
            | E::InvalidEnumValue { .. }
            | E::InvalidIdFormat { .. }
            | E::InvalidStatusTransition { .. } => ExitCode::INVALID_INPUT,
            E::Io(_) | E::Json(_) => ExitCode::FILE_OPERATION_FAILURE,
            E::TaskNotFound { .. } | E::PhaseNotFound { .. } => ExitCode::NOT_FOUND,
            E::MissingDependency { .. } => ExitCode::MISSING_DEPENDENCY,
            E::DependencyCycle { .. }
            | E::SubtaskCannotHaveChildren { .. }
            | E::DuplicateId { .. }
            | E::SingleActiveViolation { .. }
            | E::PhaseAdvanceBlocked { .. }
            | E::ValidationFailed { .. } => ExitCode::VALIDATION_ERROR,
            E::LockTimeout { .. } => ExitCode::LOCK_TIMEOUT,
            E::Config { .. } => ExitCode::CONFIG_ERROR,
            E::MaxDepthExceeded { .. } => ExitCode::MAX_DEPTH_EXCEEDED,
            E::MaxSiblingsExceeded { .. } => ExitCode::MAX_SIBLINGS_EXCEEDED,
            E::InvalidParentType { .. } => ExitCode::INVALID_PARENT_TYPE,
            E::ChecksumMismatch { .. } | E::SchemaInvalid { .. } => ExitCode::CHECKSUM_MISMATCH,
            E::SequenceDrift { .. } => ExitCode::SEQUENCE_DRIFT,
            E::SessionExists { .. } => ExitCode::SESSION_EXISTS,
            E::SessionNotFound { .. } => ExitCode::SESSION_NOT_FOUND,
            E::ScopeConflict { .. } => ExitCode::SCOPE_CONFLICT,
            E::ScopeInvalid { .. } => ExitCode::SCOPE_INVALID,
            E::TaskNotInScope { .. } => ExitCode::TASK_NOT_IN_SCOPE,
            E::TaskClaimed { .. } => ExitCode::TASK_CLAIMED,
            E::SessionRequired => ExitCode::SESSION_REQUIRED,
            E::SessionCloseBlocked { .. } => ExitCode::SESSION_CLOSE_BLOCKED,
            E::FocusRequired => ExitCode::FOCUS_REQUIRED,
            E::IdCollision { .. } => ExitCode::NOT_FOUND,
            E::LifecycleGateFailed { .. } => ExitCode::LIFECYCLE_GATE_FAILED,
            E::AlreadyInitialized => ExitCode::ALREADY_INITIALIZED,
            E::NoChange => ExitCode::NO_CHANGE,
        }
    }
}

impl TodoError {
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::from(self)
    }
}
