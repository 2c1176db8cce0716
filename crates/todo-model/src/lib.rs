//! Domain types for todo-engine (spec §3, §4.4): tasks, phases, sessions,
//! focus, the archive store, and store metadata. Everything here is a
//! plain serializable record; invariant enforcement beyond field-level
//! construction lives in `todo-validate` and `todo-mutate`.

pub mod enums;
pub mod focus;
pub mod phase;
pub mod project;
pub mod session;
pub mod store;
pub mod task;
pub mod verification;

pub use enums::{Priority, RelationType, Size, Status, TaskType};
pub use focus::Focus;
pub use phase::{Phase, PhaseHistoryEntry, PhaseStatus, PhaseTransitionType};
pub use project::ProjectState;
pub use session::{Session, ScopeType, SessionScope, SessionStatus, format_session_id};
pub use store::{ActiveStore, ArchiveStore, ArchivedTask, StoreMeta};
pub use task::{Relation, Task, TaskBuilder};
pub use verification::{FailureLogEntry, GateName, Verification};
