//! Parent/child tree and dependency DAG queries over an active task list
//! (spec §4.5).

use std::collections::{HashMap, HashSet};
use todo_model::Task;
use todo_utils::error::TodoError;

/// Maximum parent/child tree depth (epic → task → subtask).
pub const MAX_DEPTH: usize = 3;
/// Maximum siblings permitted under any one parent.
pub const MAX_SIBLINGS: usize = 7;

/// An indexed read-only view over an active task slice, built once and
/// reused for every hierarchy/graph query against the same snapshot.
pub struct TaskGraph<'a> {
    by_id: HashMap<&'a str, &'a Task>,
    children_of: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> TaskGraph<'a> {
    #[must_use]
    pub fn new(tasks: &'a [Task]) -> Self {
        let by_id = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
        let mut children_of: HashMap<&str, Vec<&str>> = HashMap::new();
        for task in tasks {
            if let Some(parent) = &task.parent_id {
                children_of.entry(parent.as_str()).or_default().push(task.id.as_str());
            }
        }
        Self { by_id, children_of }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'a Task> {
        self.by_id.get(id).copied()
    }

    /// Every task in the graph, in no particular order.
    pub fn all(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.by_id.values().copied()
    }

    /// Direct children of `id`, in no particular order.
    #[must_use]
    pub fn children(&self, id: &str) -> Vec<&'a Task> {
        self.children_of
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|cid| self.by_id.get(cid).copied())
            .collect()
    }

    /// All transitive descendants of `id` (breadth order).
    #[must_use]
    pub fn descendants(&self, id: &str) -> Vec<&'a Task> {
        let mut result = Vec::new();
        let mut frontier = vec![id.to_string()];
        while let Some(current) = frontier.pop() {
            for child in self.children(&current) {
                result.push(child);
                frontier.push(child.id.clone());
            }
        }
        result
    }

    /// Ancestor chain from `id` up to its root, nearest first.
    #[must_use]
    pub fn parent_chain(&self, id: &str) -> Vec<&'a Task> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|t| t.parent_id.clone());
        while let Some(pid) = current {
            let Some(parent) = self.get(&pid) else { break };
            chain.push(parent);
            current = parent.parent_id.clone();
        }
        chain
    }

    /// Depth of `id` in its tree (root epic is depth 0).
    #[must_use]
    pub fn depth(&self, id: &str) -> usize {
        self.parent_chain(id).len()
    }

    /// Fails if giving `parent_id` one more child would exceed [`MAX_DEPTH`].
    pub fn validate_depth(&self, parent_id: &str) -> Result<(), TodoError> {
        let prospective_child_depth = self.depth(parent_id) + 1;
        if prospective_child_depth >= MAX_DEPTH {
            return Err(TodoError::MaxDepthExceeded { parent: parent_id.to_string() });
        }
        Ok(())
    }

    /// Fails if giving `parent_id` one more child would exceed [`MAX_SIBLINGS`].
    pub fn validate_siblings(&self, parent_id: &str) -> Result<(), TodoError> {
        if self.children(parent_id).len() >= MAX_SIBLINGS {
            return Err(TodoError::MaxSiblingsExceeded { parent: parent_id.to_string() });
        }
        Ok(())
    }

    /// Whether adding the dependency edge `from -> to` (meaning `from`
    /// depends on `to`) would close a cycle, via DFS from `to` back to
    /// `from`.
    #[must_use]
    pub fn dependency_cycle(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let mut visited = HashSet::new();
        let mut stack = vec![to.to_string()];
        while let Some(current) = stack.pop() {
            if current == from {
                return true;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(task) = self.get(&current) {
                stack.extend(task.depends.iter().cloned());
            }
        }
        false
    }

    /// Full cycle check across every dependency edge currently in the
    /// graph (used by the validator, spec §4.6 check 6).
    #[must_use]
    pub fn has_any_cycle(&self) -> bool {
        for task in self.by_id.values() {
            let mut visited = HashSet::new();
            let mut stack: Vec<String> = task.depends.iter().cloned().collect();
            while let Some(current) = stack.pop() {
                if current == task.id {
                    return true;
                }
                if !visited.insert(current.clone()) {
                    continue;
                }
                if let Some(next) = self.get(&current) {
                    stack.extend(next.depends.iter().cloned());
                }
            }
        }
        false
    }

    /// Lowest common ancestor of `a` and `b`, if one exists.
    #[must_use]
    pub fn lca(&self, a: &str, b: &str) -> Option<&'a Task> {
        let ancestors_a: HashSet<&str> = std::iter::once(a)
            .chain(self.parent_chain(a).iter().map(|t| t.id.as_str()))
            .collect();
        if ancestors_a.contains(b) {
            return self.get(b);
        }
        let mut current = self.get(b).and_then(|t| t.parent_id.clone());
        while let Some(pid) = current {
            if ancestors_a.contains(pid.as_str()) {
                return self.get(&pid);
            }
            current = self.get(&pid).and_then(|t| t.parent_id.clone());
        }
        None
    }

    /// Tree distance between `a` and `b`: steps up to the LCA plus steps
    /// back down, or `None` if they share no ancestor.
    #[must_use]
    pub fn tree_distance(&self, a: &str, b: &str) -> Option<usize> {
        let lca = self.lca(a, b)?;
        let up_a = self.parent_chain(a).iter().take_while(|t| t.id != lca.id).count();
        let up_b = self.parent_chain(b).iter().take_while(|t| t.id != lca.id).count();
        Some(up_a + up_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use todo_model::{Priority, Status, TaskBuilder, TaskType};

    fn task(id: &str, parent: Option<&str>, depends: &[&str]) -> Task {
        let mut builder = TaskBuilder::new(id, "a valid title here", Utc::now())
            .priority(Priority::Medium)
            .task_type(if parent.is_none() { TaskType::Epic } else { TaskType::Task });
        if let Some(p) = parent {
            builder = builder.parent_id(p);
        }
        builder = builder.depends(depends.iter().map(|s| s.to_string()).collect());
        let _ = Status::Pending;
        builder.build().unwrap()
    }

    #[test]
    fn children_and_descendants() {
        let tasks = vec![
            task("T001", None, &[]),
            task("T002", Some("T001"), &[]),
            task("T003", Some("T002"), &[]),
        ];
        let graph = TaskGraph::new(&tasks);
        assert_eq!(graph.children("T001").len(), 1);
        assert_eq!(graph.descendants("T001").len(), 2);
        assert_eq!(graph.depth("T003"), 2);
    }

    #[test]
    fn validate_depth_rejects_beyond_max() {
        let tasks = vec![
            task("T001", None, &[]),
            task("T002", Some("T001"), &[]),
            task("T003", Some("T002"), &[]),
        ];
        let graph = TaskGraph::new(&tasks);
        assert!(graph.validate_depth("T001").is_ok());
        assert!(graph.validate_depth("T003").is_err());
    }

    #[test]
    fn validate_siblings_rejects_beyond_max() {
        let mut tasks = vec![task("E", None, &[])];
        for i in 0..7 {
            tasks.push(task(Box::leak(format!("C{i}").into_boxed_str()), Some("E"), &[]));
        }
        let graph = TaskGraph::new(&tasks);
        assert!(graph.validate_siblings("E").is_err());
    }

    #[test]
    fn detects_direct_and_transitive_cycles() {
        let tasks = vec![task("T001", None, &["T002"]), task("T002", None, &[])];
        let graph = TaskGraph::new(&tasks);
        assert!(graph.dependency_cycle("T002", "T001"));
        assert!(!graph.dependency_cycle("T002", "T003"));
    }

    #[test]
    fn has_any_cycle_detects_existing_cycle() {
        let tasks = vec![task("T001", None, &["T002"]), task("T002", None, &["T001"])];
        let graph = TaskGraph::new(&tasks);
        assert!(graph.has_any_cycle());
    }

    #[test]
    fn lca_and_tree_distance() {
        let tasks = vec![
            task("E", None, &[]),
            task("A", Some("E"), &[]),
            task("B", Some("E"), &[]),
        ];
        let graph = TaskGraph::new(&tasks);
        assert_eq!(graph.lca("A", "B").unwrap().id, "E");
        assert_eq!(graph.tree_distance("A", "B"), Some(2));
    }
}
