//! The fifteen named checks (spec §4.6).

use chrono::Utc;
use todo_config::Config;
use todo_graph::TaskGraph;
use todo_model::{ActiveStore, ArchiveStore, PhaseStatus, Status};
use todo_store::checksum;

/// Tasks pending this long or more are flagged stale (spec §4.6 check 14).
const STALE_PENDING_DAYS: i64 = 30;

/// Skip the full cycle scan above this many active tasks, per spec §4.6
/// check 6 ("skipped above a large-N threshold with warning").
const CYCLE_CHECK_MAX_TASKS: usize = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub check: &'static str,
    pub severity: Severity,
    pub message: String,
}

impl CheckOutcome {
    fn ok(check: &'static str, message: impl Into<String>) -> Self {
        Self { check, severity: Severity::Ok, message: message.into() }
    }
    fn warning(check: &'static str, message: impl Into<String>) -> Self {
        Self { check, severity: Severity::Warning, message: message.into() }
    }
    fn error(check: &'static str, message: impl Into<String>) -> Self {
        Self { check, severity: Severity::Error, message: message.into() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.outcomes.iter().any(|o| o.severity == Severity::Error)
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.severity == Severity::Error).count()
    }
}

/// Run every named check against `active` and `archive`.
#[must_use]
pub fn run(active: &ActiveStore, archive: &ArchiveStore, config: &Config) -> CheckReport {
    let mut outcomes = Vec::with_capacity(15);
    let graph = TaskGraph::new(&active.tasks);

    // 1. JSON parses: guaranteed by the time an in-memory store reaches
    // here (the atomic store's load path already rejected malformed JSON).
    outcomes.push(CheckOutcome::ok("json-parses", "store loaded successfully"));

    // 2. No duplicate ids within the active store.
    outcomes.push(check_duplicates_within_active(active));

    // 3. No duplicate ids across active ∪ archive.
    outcomes.push(check_duplicates_across_stores(active, archive));

    // 4. At most validation.maxActiveTasks tasks in status active.
    outcomes.push(check_single_active_cap(active, config));

    // 5. Every depends/parentId reference resolves.
    outcomes.push(check_references_resolve(active));

    // 6. No cycles in the dependency graph.
    outcomes.push(check_no_cycles(active, &graph));

    // 7. Every blocked task has blockedBy.
    outcomes.push(check_blocked_has_reason(active));

    // 8. Every done task has completedAt.
    outcomes.push(check_done_has_completed_at(active));

    // 9. _meta.schemaVersion present and known.
    outcomes.push(check_schema_version(active));

    // 10. Required fields on every task. Enforced by the type system at
    // construction time; this check exists for report completeness.
    outcomes.push(CheckOutcome::ok(
        "required-fields",
        "id/title/status/priority/createdAt are non-optional in the domain model",
    ));

    // 11. focus.currentTask matches the single active task when set.
    outcomes.push(check_focus_matches_active(active));

    // 12. Stored checksum equals recomputed checksum.
    outcomes.push(check_checksum(active));

    // 13. Every task has a size (warning only).
    outcomes.push(check_every_task_has_size(active));

    // 14. Stale pending tasks (warning only).
    outcomes.push(check_stale_pending(active));

    // 15. Exactly one active phase; currentPhase points at it.
    outcomes.push(check_single_active_phase(active));

    CheckReport { outcomes }
}

fn check_duplicates_within_active(active: &ActiveStore) -> CheckOutcome {
    let mut seen = std::collections::HashSet::new();
    let dupes: Vec<&str> = active
        .tasks
        .iter()
        .map(|t| t.id.as_str())
        .filter(|id| !seen.insert(*id))
        .collect();
    if dupes.is_empty() {
        CheckOutcome::ok("duplicate-ids-active", "no duplicate ids in the active store")
    } else {
        CheckOutcome::error("duplicate-ids-active", format!("duplicate ids: {dupes:?}"))
    }
}

fn check_duplicates_across_stores(active: &ActiveStore, archive: &ArchiveStore) -> CheckOutcome {
    let archived: std::collections::HashSet<&str> =
        archive.archived_tasks.iter().map(|t| t.task.id.as_str()).collect();
    let collisions: Vec<&str> =
        active.tasks.iter().map(|t| t.id.as_str()).filter(|id| archived.contains(id)).collect();
    if collisions.is_empty() {
        CheckOutcome::ok("duplicate-ids-cross-store", "no id collisions between active and archive")
    } else {
        CheckOutcome::error("duplicate-ids-cross-store", format!("colliding ids: {collisions:?}"))
    }
}

fn check_single_active_cap(active: &ActiveStore, config: &Config) -> CheckOutcome {
    let max = config.get_u64("validation.maxActiveTasks").unwrap_or(1) as usize;
    let count = active.tasks.iter().filter(|t| t.status == Status::Active).count();
    if count <= max {
        CheckOutcome::ok("single-active-cap", format!("{count}/{max} active"))
    } else {
        CheckOutcome::error("single-active-cap", format!("{count} active tasks exceeds cap of {max}"))
    }
}

fn check_references_resolve(active: &ActiveStore) -> CheckOutcome {
    let ids: std::collections::HashSet<&str> = active.tasks.iter().map(|t| t.id.as_str()).collect();
    let mut broken = Vec::new();
    for task in &active.tasks {
        if let Some(parent) = &task.parent_id {
            if !ids.contains(parent.as_str()) {
                broken.push(format!("{}.parentId -> {parent}", task.id));
            }
        }
        for dep in &task.depends {
            if !ids.contains(dep.as_str()) {
                broken.push(format!("{}.depends -> {dep}", task.id));
            }
        }
    }
    if broken.is_empty() {
        CheckOutcome::ok("referential-integrity", "all parentId/depends references resolve")
    } else {
        CheckOutcome::error("referential-integrity", format!("unresolved references: {broken:?}"))
    }
}

fn check_no_cycles(active: &ActiveStore, graph: &TaskGraph<'_>) -> CheckOutcome {
    if active.tasks.len() > CYCLE_CHECK_MAX_TASKS {
        return CheckOutcome::warning(
            "no-dependency-cycles",
            format!("skipped: {} tasks exceeds the {CYCLE_CHECK_MAX_TASKS}-task threshold", active.tasks.len()),
        );
    }
    if graph.has_any_cycle() {
        CheckOutcome::error("no-dependency-cycles", "dependency graph contains a cycle")
    } else {
        CheckOutcome::ok("no-dependency-cycles", "dependency graph is acyclic")
    }
}

fn check_blocked_has_reason(active: &ActiveStore) -> CheckOutcome {
    let missing: Vec<&str> = active
        .tasks
        .iter()
        .filter(|t| t.status == Status::Blocked && t.blocked_by.is_none())
        .map(|t| t.id.as_str())
        .collect();
    if missing.is_empty() {
        CheckOutcome::ok("blocked-has-reason", "every blocked task has blockedBy")
    } else {
        CheckOutcome::error("blocked-has-reason", format!("missing blockedBy: {missing:?}"))
    }
}

fn check_done_has_completed_at(active: &ActiveStore) -> CheckOutcome {
    let missing: Vec<&str> = active
        .tasks
        .iter()
        .filter(|t| t.status == Status::Done && t.completed_at.is_none())
        .map(|t| t.id.as_str())
        .collect();
    if missing.is_empty() {
        CheckOutcome::ok("done-has-completed-at", "every done task has completedAt")
    } else {
        CheckOutcome::error("done-has-completed-at", format!("missing completedAt: {missing:?}"))
    }
}

fn check_schema_version(active: &ActiveStore) -> CheckOutcome {
    if active.meta.schema_version == todo_model::store::SCHEMA_VERSION {
        CheckOutcome::ok("schema-version", format!("schemaVersion {}", active.meta.schema_version))
    } else {
        CheckOutcome::error("schema-version", format!("unknown schemaVersion {}", active.meta.schema_version))
    }
}

fn check_focus_matches_active(active: &ActiveStore) -> CheckOutcome {
    let Some(focused) = &active.focus.current_task else {
        return CheckOutcome::ok("focus-coherence", "no task focused");
    };
    match active.find(focused) {
        Some(task) if task.status == Status::Active => {
            CheckOutcome::ok("focus-coherence", format!("focus matches active task {focused}"))
        }
        Some(task) => CheckOutcome::error(
            "focus-coherence",
            format!("focus points at {focused} but its status is {}", task.status),
        ),
        None => CheckOutcome::error("focus-coherence", format!("focus points at missing task {focused}")),
    }
}

fn check_checksum(active: &ActiveStore) -> CheckOutcome {
    match checksum::compute_of(&active.tasks) {
        Ok(recomputed) if recomputed == active.meta.checksum => {
            CheckOutcome::ok("checksum", "stored checksum matches recomputed checksum")
        }
        Ok(recomputed) => CheckOutcome::error(
            "checksum",
            format!("stored {} != recomputed {recomputed}", active.meta.checksum),
        ),
        Err(e) => CheckOutcome::error("checksum", format!("failed to recompute checksum: {e}")),
    }
}

fn check_every_task_has_size(active: &ActiveStore) -> CheckOutcome {
    let missing: Vec<&str> =
        active.tasks.iter().filter(|t| t.size.is_none()).map(|t| t.id.as_str()).collect();
    if missing.is_empty() {
        CheckOutcome::ok("task-has-size", "every task has a size")
    } else {
        CheckOutcome::warning("task-has-size", format!("missing size: {missing:?}"))
    }
}

fn check_stale_pending(active: &ActiveStore) -> CheckOutcome {
    let now = Utc::now();
    let stale: Vec<&str> = active
        .tasks
        .iter()
        .filter(|t| t.status == Status::Pending && (now - t.created_at).num_days() >= STALE_PENDING_DAYS)
        .map(|t| t.id.as_str())
        .collect();
    if stale.is_empty() {
        CheckOutcome::ok("stale-pending", "no pending task older than 30 days")
    } else {
        CheckOutcome::warning("stale-pending", format!("stale pending tasks: {stale:?}"))
    }
}

fn check_single_active_phase(active: &ActiveStore) -> CheckOutcome {
    let active_phases: Vec<&str> = active
        .project
        .phases
        .iter()
        .filter(|(_, p)| p.status == PhaseStatus::Active)
        .map(|(slug, _)| slug.as_str())
        .collect();

    if active_phases.len() > 1 {
        return CheckOutcome::error("single-active-phase", format!("multiple active phases: {active_phases:?}"));
    }

    match (&active.project.current_phase, active_phases.first()) {
        (Some(current), Some(active_slug)) if current == active_slug => {
            CheckOutcome::ok("single-active-phase", format!("currentPhase {current} is active"))
        }
        (Some(current), Some(active_slug)) => CheckOutcome::error(
            "single-active-phase",
            format!("currentPhase {current} does not match active phase {active_slug}"),
        ),
        (None, None) | (Some(_), None) if active_phases.is_empty() => {
            CheckOutcome::ok("single-active-phase", "no active phase")
        }
        _ => CheckOutcome::ok("single-active-phase", "no active phase"),
    }
}
