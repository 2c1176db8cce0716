//! CLI argument definitions (clap derive): one top-level `Cli` with global
//! flags plus a `Commands` subcommand enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// todo - local, file-backed task-management engine
#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "A local, file-backed task-management engine for software projects")]
#[command(version)]
pub struct Cli {
    /// Path to an explicit project config file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit the structured JSON output envelope instead of plain text
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Lock acquisition timeout in seconds (default: 5)
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new project state directory
    Init {
        /// Reinitialize an already-initialized project
        #[arg(long)]
        force: bool,
    },

    /// Add a new task
    Add {
        title: String,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "type")]
        task_type: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, value_delimiter = ',')]
        depends: Vec<String>,
        #[arg(long)]
        phase: Option<String>,
        #[arg(long, value_delimiter = ',')]
        labels: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        /// Permit referencing a phase that does not exist yet
        #[arg(long)]
        add_phase: bool,
    },

    /// Update an existing task's fields
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        phase: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        blocked_by: Option<String>,
        #[arg(long, value_delimiter = ',')]
        labels: Option<Vec<String>>,
        #[arg(long, value_delimiter = ',')]
        add_depends: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        remove_depends: Vec<String>,
        #[arg(long)]
        parent: Option<String>,
    },

    /// Mark a task done
    Complete {
        id: String,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        skip_notes: bool,
    },

    /// Reopen a done task back to pending/active/blocked
    Reopen {
        id: String,
        #[arg(long, default_value = "pending")]
        target: String,
    },

    /// Cancel a task
    Cancel {
        id: String,
        reason: String,
        #[arg(long)]
        cascade: bool,
    },

    /// Revert a cancelled task back to pending
    Uncancel {
        id: String,
        #[arg(long)]
        cascade: bool,
    },

    /// Retype a subtask into a full task
    Promote {
        id: String,
        #[arg(long)]
        retype_to_task: bool,
    },

    /// Move a terminal task into the archive store, or (with no id) sweep
    /// every `done` task matching the retention criteria
    Archive {
        id: Option<String>,
        #[arg(long)]
        reason: Option<String>,
        /// Ignore `archive.daysUntilArchive` but still respect `preserveRecentCount`
        #[arg(long)]
        force: bool,
        /// Ignore both age and `preserveRecentCount`
        #[arg(long)]
        all: bool,
    },

    /// Restore an archived task back to the active store
    Unarchive { id: String },

    /// List tasks (optionally filtered)
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        phase: Option<String>,
    },

    /// Show one task in full
    Show { id: String },

    /// Run the 15 cross-entity invariant checks
    Validate {
        /// Apply deterministic, non-interactive repairs
        #[arg(long)]
        fix: bool,
    },

    /// Snapshot every persistent file into a timestamped safety backup
    Backup,

    /// Leverage/analysis views (spec §4.10)
    Analyze {
        #[command(subcommand)]
        view: AnalyzeView,
    },

    /// Phase lifecycle operations (spec §4.9)
    Phase {
        #[command(subcommand)]
        action: PhaseCommands,
    },

    /// Session lifecycle and scoping operations (spec §4.8)
    Session {
        #[command(subcommand)]
        action: SessionCommands,
    },

    /// Focus binding within the current session (spec §4.8)
    Focus {
        #[command(subcommand)]
        action: FocusCommands,
    },

    /// Verification gate operations (spec §4.11)
    Gate {
        #[command(subcommand)]
        action: GateCommands,
    },

    /// Pre-spawn lifecycle gate enforcement (spec §4.12)
    Lifecycle {
        #[command(subcommand)]
        action: LifecycleCommands,
    },
}

#[derive(Subcommand)]
pub enum AnalyzeView {
    /// The single highest-leverage actionable task
    Recommend,
    /// Tasks blocking two or more pending dependents
    Bottlenecks,
    /// Tasks grouped by label
    Domains,
    /// Waves and critical path for one epic's subtree
    EpicPlan { epic_id: String },
}

#[derive(Subcommand)]
pub enum PhaseCommands {
    Start { slug: String },
    Complete { slug: String },
    /// Complete the active phase (if guards pass) and start the next one
    Advance {
        #[arg(long)]
        force: bool,
    },
    /// Move the phase pointer directly to `slug`
    Set {
        slug: String,
        #[arg(long)]
        allow_rollback: bool,
    },
    Rename { old: String, new: String },
    Delete {
        slug: String,
        #[arg(long)]
        reassign_to: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Start a new session scoped to a subset of the task tree
    Start {
        /// epic | subtree | taskGroup | task | epicPhase
        scope_type: String,
        root_task_id: String,
        #[arg(long)]
        phase: Option<String>,
        /// Explicit initial focus task id; omit to auto-pick
        #[arg(long)]
        focus: Option<String>,
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        allow_scope_overlap: bool,
    },
    End {
        session_id: String,
        #[arg(long)]
        note: Option<String>,
    },
    Suspend { session_id: String },
    Resume { session_id: String },
    Close { session_id: String },
    Switch { session_id: String },
    List,
    Show { session_id: String },
    Status,
}

#[derive(Subcommand)]
pub enum FocusCommands {
    Set { task_id: String },
    Clear,
    Show,
    Note { text: String },
    Next { text: String },
}

#[derive(Subcommand)]
pub enum LifecycleCommands {
    /// Check whether an epic may spawn the given protocol under the
    /// configured `lifecycleEnforcement.mode`
    Spawn {
        epic_id: String,
        /// research | consensus | specification | decomposition | implementation | contribution | release
        protocol: String,
    },
    /// Record that a lifecycle stage has completed (or was explicitly
    /// skipped) for an epic
    RecordStage {
        epic_id: String,
        stage: String,
        /// completed | skipped
        #[arg(long, default_value = "completed")]
        status: String,
    },
}

#[derive(Subcommand)]
pub enum GateCommands {
    /// Set one gate on a task's verification map
    Set {
        id: String,
        /// implemented | testsPassed | qaPassed | cleanupDone | securityPassed | documented
        gate: String,
        value: bool,
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    Reset { id: String },
    Status { id: String },
}
