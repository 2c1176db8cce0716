//! Leverage scoring, tiering, bottlenecks, domains, and epic-scoped
//! wave/critical-path planning (spec §4.10).

use std::collections::{HashMap, HashSet};
use todo_model::{Priority, Status, Task};

use crate::hierarchy::TaskGraph;

/// Configurable relationship weights for the leverage formula.
#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub parent_child: f64,
    pub cross_epic: f64,
    pub cross_phase: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self { parent_child: 0.3, cross_epic: 1.0, cross_phase: 1.5 }
    }
}

/// `weightedUnlocks(t)`: the sum, over every task `d` that has `t` in its
/// `depends`, of the relationship weight between `t` and `d`.
fn weighted_unlocks(t: &Task, all: &[Task], weights: &Weights) -> f64 {
    all.iter()
        .filter(|d| d.depends.contains(&t.id))
        .map(|d| {
            let is_parent_child = t.parent_id.as_deref() == Some(d.id.as_str())
                || d.parent_id.as_deref() == Some(t.id.as_str());
            if is_parent_child {
                weights.parent_child
            } else if t.phase != d.phase {
                weights.cross_phase
            } else {
                weights.cross_epic
            }
        })
        .sum()
}

/// `leverage(t) = floor(weightedUnlocks(t) * multiplier) + priorityScore`.
#[must_use]
pub fn leverage(t: &Task, all: &[Task], weights: &Weights, multiplier: f64) -> u32 {
    let unlocks = weighted_unlocks(t, all, weights);
    (unlocks * multiplier).floor() as u32 + t.priority.score()
}

/// `actionable(t) ⇔ every dependency of t is done`.
#[must_use]
pub fn actionable(graph: &TaskGraph<'_>, t: &Task) -> bool {
    t.depends
        .iter()
        .all(|d| graph.get(d).map(|dep| dep.status == Status::Done).unwrap_or(false))
}

/// The subset of `t.depends` that are not yet done.
#[must_use]
pub fn blocking_deps<'a>(graph: &TaskGraph<'a>, t: &Task) -> Vec<&'a Task> {
    t.depends
        .iter()
        .filter_map(|d| graph.get(d))
        .filter(|dep| dep.status != Status::Done)
        .collect()
}

/// Tasks appearing in `depends` of at least two other pending tasks.
#[must_use]
pub fn bottlenecks<'a>(graph: &TaskGraph<'a>, all: &[Task]) -> Vec<&'a Task> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for t in all.iter().filter(|t| t.status == Status::Pending) {
        for d in &t.depends {
            *counts.entry(d.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .filter_map(|(id, _)| graph.get(id))
        .collect()
}

/// Mutually exclusive priority tier, evaluated top-down (spec §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Unblock,
    Critical,
    Blocked,
    Routine,
}

/// Classify `t` into its tier given how many tasks its completion would
/// unlock (`unlock_count`).
#[must_use]
pub fn tier_of(graph: &TaskGraph<'_>, t: &Task, unlock_count: usize) -> Tier {
    let is_actionable = actionable(graph, t);
    if is_actionable && unlock_count >= 3 {
        Tier::Unblock
    } else if is_actionable && matches!(t.priority, Priority::Critical | Priority::High) {
        Tier::Critical
    } else if !is_actionable {
        Tier::Blocked
    } else {
        Tier::Routine
    }
}

/// Count, per task id, how many other tasks list it as a dependency —
/// used both for tiering and as the unlock count feeding it.
#[must_use]
pub fn unlock_counts(all: &[Task]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for t in all {
        for d in &t.depends {
            *counts.entry(d.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// One label-grouped bucket of the domain view.
#[derive(Debug, Clone)]
pub struct Domain {
    pub domain: String,
    pub count: usize,
    pub actionable_count: usize,
    pub tasks: Vec<String>,
}

/// Group tasks by label (spec §4.10 "Domains").
#[must_use]
pub fn domains(graph: &TaskGraph<'_>, all: &[Task]) -> Vec<Domain> {
    let mut by_label: HashMap<&str, Vec<&Task>> = HashMap::new();
    for t in all {
        for label in &t.labels {
            by_label.entry(label.as_str()).or_default().push(t);
        }
    }
    let mut result: Vec<Domain> = by_label
        .into_iter()
        .map(|(label, tasks)| Domain {
            domain: label.to_string(),
            count: tasks.len(),
            actionable_count: tasks.iter().filter(|t| actionable(graph, t)).count(),
            tasks: tasks.iter().map(|t| t.id.clone()).collect(),
        })
        .collect();
    result.sort_by(|a, b| a.domain.cmp(&b.domain));
    result
}

/// The single highest-leverage task, tie-broken by priority then id.
#[must_use]
pub fn recommendation<'a>(
    graph: &TaskGraph<'a>,
    all: &[Task],
    weights: &Weights,
    multiplier: f64,
) -> Option<&'a Task> {
    all.iter()
        .filter(|t| t.status != Status::Done && t.status != Status::Cancelled)
        .max_by(|a, b| {
            let la = leverage(a, all, weights, multiplier);
            let lb = leverage(b, all, weights, multiplier);
            la.cmp(&lb).then(a.priority.cmp(&b.priority)).then(b.id.cmp(&a.id))
        })
        .and_then(|t| graph.get(&t.id))
}

/// Derived planning view for one epic's subtree (spec §4.10
/// "Epic-scoped view").
#[derive(Debug, Clone)]
pub struct EpicPlan {
    /// Ordered sets of task ids executable in parallel.
    pub waves: Vec<Vec<String>>,
    /// Longest path through the dependency DAG restricted to the subtree.
    pub critical_path: Vec<String>,
    pub completed: usize,
    pub ready: usize,
    pub blocked: usize,
}

/// Build the epic-scoped plan for `epic_id`'s subtree.
#[must_use]
pub fn epic_plan(graph: &TaskGraph<'_>, epic_id: &str) -> EpicPlan {
    let subtree: Vec<&Task> = graph.descendants(epic_id);
    let ids: HashSet<&str> = subtree.iter().map(|t| t.id.as_str()).collect();

    let mut wave_of: HashMap<String, u32> = HashMap::new();
    fn compute_wave(
        id: &str,
        graph: &TaskGraph<'_>,
        ids: &HashSet<&str>,
        wave_of: &mut HashMap<String, u32>,
        visiting: &mut HashSet<String>,
    ) -> u32 {
        if let Some(w) = wave_of.get(id) {
            return *w;
        }
        if !visiting.insert(id.to_string()) {
            return 0; // cycle guard; validator is responsible for rejecting cycles
        }
        let Some(task) = graph.get(id) else {
            visiting.remove(id);
            return 0;
        };
        let wave = task
            .depends
            .iter()
            .filter(|d| ids.contains(d.as_str()))
            .map(|d| compute_wave(d, graph, ids, wave_of, visiting) + 1)
            .max()
            .unwrap_or(0);
        visiting.remove(id);
        wave_of.insert(id.to_string(), wave);
        wave
    }

    let mut visiting = HashSet::new();
    for task in &subtree {
        compute_wave(&task.id, graph, &ids, &mut wave_of, &mut visiting);
    }

    let max_wave = wave_of.values().copied().max().unwrap_or(0);
    let mut waves: Vec<Vec<String>> = vec![Vec::new(); (max_wave + 1) as usize];
    for (id, wave) in &wave_of {
        waves[*wave as usize].push(id.clone());
    }
    for wave in &mut waves {
        wave.sort();
    }

    let critical_path = wave_of
        .iter()
        .max_by_key(|(_, w)| **w)
        .map(|(id, _)| build_path_to(id, graph, &ids, &wave_of))
        .unwrap_or_default();

    let completed = subtree.iter().filter(|t| t.status == Status::Done).count();
    let blocked = subtree.iter().filter(|t| !actionable(graph, t) && t.status != Status::Done).count();
    let ready = subtree.len() - completed - blocked;

    EpicPlan { waves, critical_path, completed, ready, blocked }
}

fn build_path_to(
    id: &str,
    graph: &TaskGraph<'_>,
    ids: &HashSet<&str>,
    wave_of: &HashMap<String, u32>,
) -> Vec<String> {
    let Some(task) = graph.get(id) else { return vec![id.to_string()] };
    let predecessor = task
        .depends
        .iter()
        .filter(|d| ids.contains(d.as_str()))
        .max_by_key(|d| wave_of.get(*d).copied().unwrap_or(0));
    match predecessor {
        Some(pred) => {
            let mut path = build_path_to(pred, graph, ids, wave_of);
            path.push(id.to_string());
            path
        }
        None => vec![id.to_string()],
    }
}
