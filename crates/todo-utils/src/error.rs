//! Error taxonomy for todo-engine (spec §7).
//!
//! `TodoError` is the primary error type returned by core library
//! operations. Library code returns `Result<T, TodoError>` and never calls
//! `std::process::exit`; only the CLI binary maps errors to exit codes via
//! [`TodoError::to_exit_code`].

use thiserror::Error;

/// Library-level error type with enough context to build the structured
/// error envelope from spec §6 (`{code, message, exitCode, recoverable,
/// suggestion?, context?}`).
#[derive(Error, Debug)]
pub enum TodoError {
    // ---- Input errors ----
    #[error("invalid argument: {message}")]
    InvalidInput { message: String },

    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    #[error("phase not found: {slug}")]
    PhaseNotFound { slug: String },

    #[error("unknown enum value '{value}' for {field}")]
    InvalidEnumValue { field: String, value: String },

    #[error("invalid task id '{id}': must match T\\d{{3,}}")]
    InvalidIdFormat { id: String },

    #[error("missing external dependency: {name}")]
    MissingDependency { name: String },

    // ---- Invariant errors ----
    #[error("dependency cycle would be introduced by {from} -> {to}")]
    DependencyCycle { from: String, to: String },

    #[error("parent '{parent}' already has maximum depth (3)")]
    MaxDepthExceeded { parent: String },

    #[error("parent '{parent}' already has maximum siblings (7)")]
    MaxSiblingsExceeded { parent: String },

    #[error("subtask '{id}' cannot have children")]
    SubtaskCannotHaveChildren { id: String },

    #[error("parent '{id}' is not a valid parent type for the requested child type")]
    InvalidParentType { id: String },

    #[error("duplicate id '{id}' across active and archive stores")]
    DuplicateId { id: String },

    #[error("at most {max} task(s) may be active at once; {current} already active")]
    SingleActiveViolation { max: u32, current: u32 },

    #[error("phase '{slug}' cannot advance: {reason}")]
    PhaseAdvanceBlocked { slug: String, reason: String },

    // ---- State errors ----
    #[error("cannot transition task '{id}' from {from} to {to}")]
    InvalidStatusTransition { id: String, from: String, to: String },

    #[error("session '{id}' not found")]
    SessionNotFound { id: String },

    #[error("session already exists: {id}")]
    SessionExists { id: String },

    #[error("session scope conflicts with active session '{other}'")]
    ScopeConflict { other: String },

    #[error("invalid session scope: {reason}")]
    ScopeInvalid { reason: String },

    #[error("task '{id}' is not in the current session's scope")]
    TaskNotInScope { id: String },

    #[error("task '{id}' is already claimed by session '{session}'")]
    TaskClaimed { id: String, session: String },

    #[error("this operation requires an active session")]
    SessionRequired,

    #[error("cannot close session '{id}': {remaining} in-scope task(s) not done")]
    SessionCloseBlocked { id: String, remaining: usize },

    #[error("this operation requires a focused task")]
    FocusRequired,

    #[error("archived task id '{id}' collides with an active task")]
    IdCollision { id: String },

    #[error("already initialized")]
    AlreadyInitialized,

    #[error("no change")]
    NoChange,

    // ---- Resource errors ----
    #[error("timed out waiting for lock on {path}")]
    LockTimeout { path: String },

    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("schema invalid: {reason}")]
    SchemaInvalid { reason: String },

    #[error("checksum mismatch for {path}")]
    ChecksumMismatch { path: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    // ---- Sequence ----
    #[error("sequence drift detected: counter {counter} <= max id {max_id}")]
    SequenceDrift { counter: u64, max_id: u64 },

    // ---- Protocol / lifecycle errors ----
    #[error("validation failed: {issue_count} issue(s)")]
    ValidationFailed { issue_count: usize },

    #[error("lifecycle gate failed: missing prerequisite stage(s) {missing:?}")]
    LifecycleGateFailed { missing: Vec<String> },

    #[error("config error: {message}")]
    Config { message: String },
}

impl TodoError {
    /// Whether the caller can plausibly recover by adjusting input and
    /// retrying (as opposed to a resource failure requiring intervention).
    #[must_use]
    pub fn recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Io(_) | Self::ChecksumMismatch { .. } | Self::SchemaInvalid { .. }
        )
    }

    /// A short actionable suggestion, when one exists, for the structured
    /// error envelope.
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::MaxDepthExceeded { .. } => {
                Some("choose a shallower parent (max depth is 3)".to_string())
            }
            Self::MaxSiblingsExceeded { .. } => {
                Some("move the new task under a different parent".to_string())
            }
            Self::DependencyCycle { .. } => {
                Some("remove one of the conflicting depends edges".to_string())
            }
            Self::SingleActiveViolation { .. } => {
                Some("complete, cancel, or reopen the current active task first".to_string())
            }
            Self::SequenceDrift { .. } => Some("run `validate --fix` to repair the sequence".to_string()),
            Self::ChecksumMismatch { .. } => {
                Some("run `validate --fix` to recompute the checksum".to_string())
            }
            Self::LifecycleGateFailed { missing } => Some(format!(
                "record completion of stage(s) {missing:?} before spawning this protocol"
            )),
            _ => None,
        }
    }

    /// Stable machine-readable error code for the structured envelope
    /// (spec §6/§7). Distinct from [`Self::to_exit_code`], which is the
    /// process exit status.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::TaskNotFound { .. } => "task_not_found",
            Self::PhaseNotFound { .. } => "phase_not_found",
            Self::InvalidEnumValue { .. } => "invalid_enum_value",
            Self::InvalidIdFormat { .. } => "invalid_id_format",
            Self::MissingDependency { .. } => "missing_dependency",
            Self::DependencyCycle { .. } => "dependency_cycle",
            Self::MaxDepthExceeded { .. } => "max_depth_exceeded",
            Self::MaxSiblingsExceeded { .. } => "max_siblings_exceeded",
            Self::SubtaskCannotHaveChildren { .. } => "subtask_cannot_have_children",
            Self::InvalidParentType { .. } => "invalid_parent_type",
            Self::DuplicateId { .. } => "duplicate_id",
            Self::SingleActiveViolation { .. } => "single_active_violation",
            Self::PhaseAdvanceBlocked { .. } => "phase_advance_blocked",
            Self::InvalidStatusTransition { .. } => "invalid_status_transition",
            Self::SessionNotFound { .. } => "session_not_found",
            Self::SessionExists { .. } => "session_exists",
            Self::ScopeConflict { .. } => "scope_conflict",
            Self::ScopeInvalid { .. } => "scope_invalid",
            Self::TaskNotInScope { .. } => "task_not_in_scope",
            Self::TaskClaimed { .. } => "task_claimed",
            Self::SessionRequired => "session_required",
            Self::SessionCloseBlocked { .. } => "session_close_blocked",
            Self::FocusRequired => "focus_required",
            Self::IdCollision { .. } => "id_collision",
            Self::AlreadyInitialized => "already_initialized",
            Self::NoChange => "no_change",
            Self::LockTimeout { .. } => "lock_timeout",
            Self::Io(_) => "io_error",
            Self::SchemaInvalid { .. } => "schema_invalid",
            Self::ChecksumMismatch { .. } => "checksum_mismatch",
            Self::Json(_) => "json_error",
            Self::SequenceDrift { .. } => "sequence_drift",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::LifecycleGateFailed { .. } => "lifecycle_gate_failed",
            Self::Config { .. } => "config_error",
        }
    }
}
