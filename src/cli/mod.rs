//! Command-line interface for todo-engine.
//!
//! `args` holds the clap structures, `output` builds the structured
//! envelope, and this module dispatches each parsed command straight into
//! the relevant `todo-*` crate. No command contains domain logic of its
//! own.

pub mod args;
pub mod output;

use std::str::FromStr;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use serde_json::json;

use args::{AnalyzeView, Cli, Commands, FocusCommands, GateCommands, LifecycleCommands, PhaseCommands, SessionCommands};
use todo_config::Config;
use todo_graph::{TaskGraph, analysis};
use todo_model::{Focus, ScopeType, Status};
use todo_mutate::StoreHandle;
use todo_mutate::add::AddOptions;
use todo_mutate::complete::CompleteOptions;
use todo_mutate::update::TaskChanges;
use todo_utils::error::TodoError;
use todo_utils::paths::{StorePaths, project_root};

/// Parse argv, run the requested command, and return the process exit
/// code. `main` is responsible only for calling this and exiting.
#[must_use]
pub fn run() -> i32 {
    let cli = Cli::parse();
    let _ = todo_utils::logging::init_tracing(cli.verbose);

    let command_name = command_name(&cli.command);
    match dispatch(&cli) {
        Ok(payload) => output::success(command_name, cli.json, payload),
        Err(err) => output::failure(command_name, cli.json, &err),
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Add { .. } => "add",
        Commands::Update { .. } => "update",
        Commands::Complete { .. } => "complete",
        Commands::Reopen { .. } => "reopen",
        Commands::Cancel { .. } => "cancel",
        Commands::Uncancel { .. } => "uncancel",
        Commands::Promote { .. } => "promote",
        Commands::Archive { .. } => "archive",
        Commands::Unarchive { .. } => "unarchive",
        Commands::List { .. } => "list",
        Commands::Show { .. } => "show",
        Commands::Validate { .. } => "validate",
        Commands::Backup => "backup",
        Commands::Analyze { .. } => "analyze",
        Commands::Phase { .. } => "phase",
        Commands::Session { .. } => "session",
        Commands::Focus { .. } => "focus",
        Commands::Gate { .. } => "gate",
        Commands::Lifecycle { .. } => "lifecycle",
    }
}

fn parse_enum<T: FromStr>(field: &str, raw: &str) -> Result<T, TodoError> {
    raw.parse::<T>().map_err(|_| TodoError::InvalidEnumValue { field: field.to_string(), value: raw.to_string() })
}

fn dispatch(cli: &Cli) -> Result<serde_json::Value, TodoError> {
    let root = project_root(&cwd());
    let paths = StorePaths::new(root);
    let lock_timeout = cli.lock_timeout.map(Duration::from_secs).unwrap_or(todo_lock::DEFAULT_TIMEOUT);
    let handle = StoreHandle::new(paths.clone());

    match &cli.command {
        Commands::Init { force } => cmd_init(&paths, *force),

        Commands::Add {
            title,
            priority,
            status,
            task_type,
            size,
            parent,
            depends,
            phase,
            labels,
            description,
            add_phase,
        } => {
            let config = load_config(&paths)?;
            let max_active_tasks = config.get_u64("validation.maxActiveTasks").unwrap_or(1) as u32;
            let opts = AddOptions {
                priority: priority.as_deref().map(|p| parse_enum("priority", p)).transpose()?,
                status: status.as_deref().map(|s| parse_enum("status", s)).transpose()?,
                task_type: task_type.as_deref().map(|t| parse_enum("type", t)).transpose()?,
                size: size.as_deref().map(|s| parse_enum("size", s)).transpose()?,
                parent_id: parent.clone(),
                depends: depends.iter().cloned().collect(),
                phase: phase.clone(),
                labels: labels.iter().cloned().collect(),
                description: description.clone(),
                add_phase: *add_phase,
                max_active_tasks,
            };
            let outcome = todo_mutate::add::add(&handle, title, opts)?;
            Ok(json!({ "id": outcome.id, "warnings": outcome.warnings }))
        }

        Commands::Update {
            id,
            title,
            status,
            priority,
            phase,
            description,
            blocked_by,
            labels,
            add_depends,
            remove_depends,
            parent,
        } => {
            let config = load_config(&paths)?;
            let max_active_tasks = config.get_u64("validation.maxActiveTasks").unwrap_or(1) as u32;
            let changes = TaskChanges {
                title: title.clone(),
                status: status.as_deref().map(|s| parse_enum("status", s)).transpose()?,
                priority: priority.as_deref().map(|p| parse_enum("priority", p)).transpose()?,
                phase: phase.clone(),
                description: description.clone(),
                blocked_by: blocked_by.clone(),
                labels: labels.as_ref().map(|l| l.iter().cloned().collect()),
                add_depends: add_depends.iter().cloned().collect(),
                remove_depends: remove_depends.iter().cloned().collect(),
                parent_id: parent.clone(),
                max_active_tasks,
            };
            todo_mutate::update::update(&handle, id, changes)?;
            Ok(json!({ "id": id }))
        }

        Commands::Complete { id, notes, skip_notes } => {
            let opts = CompleteOptions { notes: notes.clone(), skip_notes: *skip_notes };
            todo_mutate::complete::complete(&handle, id, opts)?;
            Ok(json!({ "id": id }))
        }

        Commands::Reopen { id, target } => {
            let config = load_config(&paths)?;
            let max_active_tasks = config.get_u64("validation.maxActiveTasks").unwrap_or(1) as u32;
            let target = parse_enum::<Status>("status", target)?;
            todo_mutate::lifecycle::reopen(&handle, id, target, max_active_tasks)?;
            Ok(json!({ "id": id }))
        }

        Commands::Cancel { id, reason, cascade } => {
            todo_mutate::lifecycle::cancel(&handle, id, reason, *cascade)?;
            Ok(json!({ "id": id }))
        }

        Commands::Uncancel { id, cascade } => {
            todo_mutate::lifecycle::uncancel(&handle, id, *cascade)?;
            Ok(json!({ "id": id }))
        }

        Commands::Promote { id, retype_to_task } => {
            todo_mutate::lifecycle::promote(&handle, id, *retype_to_task)?;
            Ok(json!({ "id": id }))
        }

        Commands::Archive { id, reason, force, all } => match id {
            Some(id) => {
                todo_mutate::archive::archive(&handle, id, reason.clone())?;
                Ok(json!({ "id": id }))
            }
            None => {
                let config = load_config(&paths)?;
                let criteria = todo_mutate::archive::ArchiveCriteria { force: *force, all: *all };
                let archived = todo_mutate::archive::archive_matching(&handle, &config, criteria)?;
                Ok(json!({ "archivedIds": archived }))
            }
        },

        Commands::Unarchive { id } => {
            todo_mutate::archive::unarchive(&handle, id)?;
            Ok(json!({ "id": id }))
        }

        Commands::List { status, phase } => {
            let active = handle.read_active()?;
            let status_filter = status.as_deref().map(|s| parse_enum::<Status>("status", s)).transpose()?;
            let tasks: Vec<_> = active
                .tasks
                .iter()
                .filter(|t| status_filter.map(|s| t.status == s).unwrap_or(true))
                .filter(|t| phase.as_deref().map(|p| t.phase.as_deref() == Some(p)).unwrap_or(true))
                .collect();
            Ok(json!({ "tasks": tasks }))
        }

        Commands::Show { id } => {
            let active = handle.read_active()?;
            let task = active.find(id).ok_or_else(|| TodoError::TaskNotFound { id: id.clone() })?;
            Ok(serde_json::to_value(task)?)
        }

        Commands::Validate { fix } => {
            let config = load_config(&paths)?;
            if *fix {
                let sequence = todo_store::SequenceAllocator::new(paths.sequence_file());
                let (dup_applied, fix_applied, report) = handle.mutate_both(|active, archive| {
                    let dup_outcome = todo_validate::fix_duplicates(active, archive);
                    let fix_outcome = todo_validate::fix(active, archive, &sequence)?;
                    let report = todo_validate::run(active, archive, &config);
                    Ok::<_, TodoError>((dup_outcome.applied, fix_outcome.applied, report))
                })?;
                Ok(json!({
                    "errorCount": report.error_count(),
                    "duplicatesFixed": dup_applied,
                    "repaired": fix_applied,
                }))
            } else {
                let active = handle.read_active()?;
                let archive = handle.read_archive()?;
                let report = todo_validate::run(&active, &archive, &config);
                let outcomes: Vec<_> = report
                    .outcomes
                    .iter()
                    .map(|o| json!({"check": o.check, "severity": format!("{:?}", o.severity), "message": o.message}))
                    .collect();
                Ok(json!({ "errorCount": report.error_count(), "outcomes": outcomes }))
            }
        }

        Commands::Backup => {
            let config = load_config(&paths)?;
            let dir = todo_mutate::backup::backup(&paths, &config)?;
            Ok(json!({ "path": dir.to_string() }))
        }

        Commands::Analyze { view } => cmd_analyze(&handle, view),

        Commands::Phase { action } => cmd_phase(&handle, &paths, action),

        Commands::Session { action } => cmd_session(&paths, lock_timeout, action),

        Commands::Focus { action } => cmd_focus(&paths, lock_timeout, action),

        Commands::Gate { action } => cmd_gate(&handle, action),

        Commands::Lifecycle { action } => cmd_lifecycle(&paths, lock_timeout, action),
    }
}

fn cwd() -> Utf8PathBuf {
    let dir = std::env::current_dir().unwrap_or_else(|_| ".".into());
    Utf8PathBuf::from_path_buf(dir).unwrap_or_else(|_| Utf8PathBuf::from("."))
}

fn load_config(paths: &StorePaths) -> Result<Config, TodoError> {
    Config::load(paths.config_file(), StorePaths::global_config_file(), json!({}))
}

fn cmd_init(paths: &StorePaths, force: bool) -> Result<serde_json::Value, TodoError> {
    if paths.active_store().exists() && !force {
        return Err(TodoError::AlreadyInitialized);
    }
    todo_utils::paths::ensure_dir_all(&paths.state_dir())?;
    let handle = StoreHandle::new(paths.clone());
    handle.mutate_active(|_active, _archive| Ok::<_, TodoError>(()))?;
    Ok(json!({ "root": paths.state_dir().to_string() }))
}

fn cmd_analyze(handle: &StoreHandle, view: &AnalyzeView) -> Result<serde_json::Value, TodoError> {
    let active = handle.read_active()?;
    let graph = TaskGraph::new(&active.tasks);
    match view {
        AnalyzeView::Recommend => {
            let weights = analysis::Weights::default();
            let task = analysis::recommendation(&graph, &active.tasks, &weights, 15.0);
            Ok(json!({ "task": task }))
        }
        AnalyzeView::Bottlenecks => {
            let tasks = analysis::bottlenecks(&graph, &active.tasks);
            Ok(json!({ "tasks": tasks }))
        }
        AnalyzeView::Domains => {
            let domains = analysis::domains(&graph, &active.tasks);
            Ok(serde_json::to_value(
                domains
                    .into_iter()
                    .map(|d| json!({"domain": d.domain, "count": d.count, "actionableCount": d.actionable_count, "tasks": d.tasks}))
                    .collect::<Vec<_>>(),
            )?)
        }
        AnalyzeView::EpicPlan { epic_id } => {
            let plan = analysis::epic_plan(&graph, epic_id);
            Ok(json!({
                "waves": plan.waves,
                "criticalPath": plan.critical_path,
                "completed": plan.completed,
                "ready": plan.ready,
                "blocked": plan.blocked,
            }))
        }
    }
}

fn cmd_phase(handle: &StoreHandle, paths: &StorePaths, action: &PhaseCommands) -> Result<serde_json::Value, TodoError> {
    match action {
        PhaseCommands::Start { slug } => {
            todo_phase::start(handle, slug)?;
            Ok(json!({ "slug": slug }))
        }
        PhaseCommands::Complete { slug } => {
            todo_phase::complete(handle, slug)?;
            Ok(json!({ "slug": slug }))
        }
        PhaseCommands::Advance { force } => {
            let config = load_config(paths)?;
            let next = todo_phase::advance(handle, &config, todo_phase::AdvanceOptions { force: *force })?;
            Ok(json!({ "next": next }))
        }
        PhaseCommands::Set { slug, allow_rollback } => {
            todo_phase::set(handle, slug, *allow_rollback)?;
            Ok(json!({ "slug": slug }))
        }
        PhaseCommands::Rename { old, new } => {
            todo_phase::rename(handle, old, new)?;
            Ok(json!({ "old": old, "new": new }))
        }
        PhaseCommands::Delete { slug, reassign_to } => {
            todo_phase::delete(handle, slug, reassign_to.as_deref())?;
            Ok(json!({ "slug": slug }))
        }
    }
}

fn cmd_session(paths: &StorePaths, lock_timeout: Duration, action: &SessionCommands) -> Result<serde_json::Value, TodoError> {
    match action {
        SessionCommands::Start { scope_type, root_task_id, phase, focus, agent, name, allow_scope_overlap } => {
            let config = load_config(paths)?;
            let scope_type = parse_enum::<ScopeType>("scopeType", scope_type)?;
            let focus_choice = match focus {
                Some(id) => todo_session::FocusChoice::Task(id.clone()),
                None => todo_session::FocusChoice::Auto,
            };
            let opts = todo_session::StartOptions {
                agent: agent.clone(),
                name: name.clone(),
                allow_scope_overlap: *allow_scope_overlap,
            };
            let id =
                todo_session::start(paths, lock_timeout, &config, scope_type, root_task_id, phase.clone(), focus_choice, opts)?;
            Ok(json!({ "sessionId": id }))
        }
        SessionCommands::End { session_id, note } => {
            todo_session::end(paths, lock_timeout, session_id, note.clone())?;
            Ok(json!({ "sessionId": session_id }))
        }
        SessionCommands::Suspend { session_id } => {
            todo_session::suspend(paths, lock_timeout, session_id)?;
            Ok(json!({ "sessionId": session_id }))
        }
        SessionCommands::Resume { session_id } => {
            todo_session::resume(paths, lock_timeout, session_id)?;
            Ok(json!({ "sessionId": session_id }))
        }
        SessionCommands::Close { session_id } => {
            todo_session::close(paths, lock_timeout, session_id)?;
            Ok(json!({ "sessionId": session_id }))
        }
        SessionCommands::Switch { session_id } => {
            todo_session::switch(paths, session_id)?;
            Ok(json!({ "sessionId": session_id }))
        }
        SessionCommands::List => {
            let sessions = todo_session::list(paths)?;
            Ok(json!({ "sessions": sessions }))
        }
        SessionCommands::Show { session_id } => {
            let session = todo_session::show(paths, session_id)?;
            Ok(serde_json::to_value(session)?)
        }
        SessionCommands::Status => {
            let session = todo_session::status(paths)?;
            Ok(json!({ "session": session }))
        }
    }
}

fn cmd_focus(paths: &StorePaths, lock_timeout: Duration, action: &FocusCommands) -> Result<serde_json::Value, TodoError> {
    match action {
        FocusCommands::Set { task_id } => {
            let config = load_config(paths)?;
            todo_session::focus::set(paths, lock_timeout, &config, task_id)?;
            Ok(json!({ "taskId": task_id }))
        }
        FocusCommands::Clear => {
            todo_session::focus::clear(paths, lock_timeout)?;
            Ok(json!({}))
        }
        FocusCommands::Show => {
            let focus: Focus = todo_session::focus::show(paths)?;
            Ok(serde_json::to_value(focus)?)
        }
        FocusCommands::Note { text } => {
            todo_session::focus::note(paths, lock_timeout, text.clone())?;
            Ok(json!({}))
        }
        FocusCommands::Next { text } => {
            todo_session::focus::next(paths, lock_timeout, text.clone())?;
            Ok(json!({}))
        }
    }
}

fn cmd_gate(handle: &StoreHandle, action: &GateCommands) -> Result<serde_json::Value, TodoError> {
    match action {
        GateCommands::Set { id, gate, value, agent, reason } => {
            let gate = parse_enum::<todo_model::GateName>("gate", gate)?;
            let verification = todo_gate::set_gate(handle, id, gate, *value, agent.clone(), reason.clone())?;
            Ok(serde_json::to_value(verification)?)
        }
        GateCommands::Reset { id } => {
            let verification = todo_gate::reset(handle, id)?;
            Ok(serde_json::to_value(verification)?)
        }
        GateCommands::Status { id } => {
            let verification = todo_gate::gate_status(handle, id)?;
            Ok(serde_json::to_value(verification)?)
        }
    }
}

fn cmd_lifecycle(paths: &StorePaths, lock_timeout: Duration, action: &LifecycleCommands) -> Result<serde_json::Value, TodoError> {
    match action {
        LifecycleCommands::Spawn { epic_id, protocol } => {
            let config = load_config(paths)?;
            let mode = todo_gate::GateMode::from_config_str(config.get_str("lifecycleEnforcement.mode").as_deref().unwrap_or("advisory"));
            let protocol = parse_enum::<todo_gate::ProtocolType>("protocol", protocol)?;
            todo_gate::enforce(paths, epic_id, protocol, mode)?;
            Ok(json!({ "epicId": epic_id, "protocol": protocol.to_string(), "allowed": true }))
        }
        LifecycleCommands::RecordStage { epic_id, stage, status } => {
            let status = parse_enum::<todo_gate::StageStatus>("status", status)?;
            todo_gate::record_stage_completion(paths, lock_timeout, epic_id, stage, status)?;
            Ok(json!({ "epicId": epic_id, "stage": stage, "status": status.to_string() }))
        }
    }
}
