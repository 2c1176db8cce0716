//! Scope resolution (spec §4.8): compute the set of task ids a session's
//! scope covers, and detect scope overlap between sessions.

use std::collections::BTreeSet;
use todo_graph::TaskGraph;
use todo_model::{ScopeType, TaskType};
use todo_utils::error::TodoError;

/// Resolve `scope_type` rooted at `root_task_id` (and, for `epicPhase`,
/// further restricted to `phase`) into the concrete set of task ids it
/// covers.
pub fn task_ids(
    graph: &TaskGraph<'_>,
    scope_type: ScopeType,
    root_task_id: &str,
    phase: Option<&str>,
) -> Result<BTreeSet<String>, TodoError> {
    let root = graph.get(root_task_id).ok_or_else(|| TodoError::TaskNotFound { id: root_task_id.to_string() })?;

    match scope_type {
        ScopeType::Epic => {
            if root.task_type != TaskType::Epic {
                return Err(TodoError::ScopeInvalid {
                    reason: format!("'{root_task_id}' is not an epic"),
                });
            }
            Ok(subtree_ids(graph, root_task_id))
        }
        ScopeType::Subtree => Ok(subtree_ids(graph, root_task_id)),
        ScopeType::Task => Ok([root_task_id.to_string()].into_iter().collect()),
        ScopeType::TaskGroup => {
            // `root_task_id` names a label shared by every task in the group.
            let label = root_task_id;
            Ok(graph
                .all()
                .filter(|t| t.labels.contains(label))
                .map(|t| t.id.clone())
                .collect())
        }
        ScopeType::EpicPhase => {
            if root.task_type != TaskType::Epic {
                return Err(TodoError::ScopeInvalid {
                    reason: format!("'{root_task_id}' is not an epic"),
                });
            }
            let phase = phase.ok_or_else(|| TodoError::ScopeInvalid {
                reason: "epicPhase scope requires a phase".to_string(),
            })?;
            Ok(subtree_ids(graph, root_task_id)
                .into_iter()
                .filter(|id| graph.get(id).is_some_and(|t| t.phase.as_deref() == Some(phase)))
                .collect())
        }
    }
}

fn subtree_ids(graph: &TaskGraph<'_>, root: &str) -> BTreeSet<String> {
    let mut ids: BTreeSet<String> = graph.descendants(root).iter().map(|t| t.id.clone()).collect();
    ids.insert(root.to_string());
    ids
}

/// Whether two scopes share at least one task id.
#[must_use]
pub fn intersects(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    a.intersection(b).next().is_some()
}
