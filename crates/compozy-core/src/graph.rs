//! Task dependency graph checks.
//!
//! Edges point from a task to the task it depends on. The graph of one
//! problem must stay acyclic.

use std::collections::HashMap;
use std::hash::BuildHasher;

use rustworkx_core::petgraph::Direction;
use rustworkx_core::petgraph::algo::{has_path_connecting, toposort};
use rustworkx_core::petgraph::graph::{DiGraph, NodeIndex};

use crate::entities::Task;
use crate::errors::CoreError;

/// Per-problem dependency DAG. Edges run from a dependency to the task
/// waiting on it, so a topological sort lists dependencies first.
#[derive(Default)]
struct DependencyGraph<'a> {
    graph: DiGraph<&'a str, ()>,
    id_to_index: HashMap<&'a str, NodeIndex>,
}

impl<'a> DependencyGraph<'a> {
    fn node(&mut self, id: &'a str) -> NodeIndex {
        if let Some(&index) = self.id_to_index.get(id) {
            return index;
        }
        let index = self.graph.add_node(id);
        self.id_to_index.insert(id, index);
        index
    }

    fn link(&mut self, dependency: &'a str, task: &'a str) {
        let from = self.node(dependency);
        let to = self.node(task);
        self.graph.update_edge(from, to, ());
    }
}

/// Whether adding `task_id -> depends_on` would close a cycle.
///
/// `edges` maps each task to the tasks it already depends on.
#[must_use]
pub fn would_create_cycle<S: BuildHasher>(
    edges: &HashMap<String, Vec<String>, S>,
    task_id: &str,
    depends_on: &str,
) -> bool {
    if task_id == depends_on {
        return true;
    }
    let mut deps = DependencyGraph::default();
    for (task, targets) in edges {
        for dependency in targets {
            deps.link(dependency, task);
        }
    }
    // Closes a cycle iff depends_on already waits on task_id.
    match (deps.id_to_index.get(task_id), deps.id_to_index.get(depends_on)) {
        (Some(&from), Some(&to)) => has_path_connecting(&deps.graph, from, to, None),
        _ => false,
    }
}

/// Topological order of `tasks`, dependencies first.
///
/// Tasks are grouped by dependency depth; within a depth, ties are broken
/// by `order_index` then id. Dependencies on tasks outside the slice are
/// ignored.
///
/// # Errors
///
/// Returns `CoreError::CyclicDependency` if the stored graph contains a cycle.
pub fn execution_order(tasks: &[Task]) -> Result<Vec<String>, CoreError> {
    let mut deps = DependencyGraph::default();
    let mut order_index: HashMap<&str, i64> = HashMap::with_capacity(tasks.len());
    for task in tasks {
        deps.node(&task.id);
        order_index.insert(task.id.as_str(), task.order_index);
    }
    for task in tasks {
        for dependency in &task.dependencies {
            if order_index.contains_key(dependency.as_str()) {
                deps.link(dependency, &task.id);
            }
        }
    }

    let sorted = toposort(&deps.graph, None).map_err(|cycle| {
        let task_id = deps.graph[cycle.node_id()];
        let depends_on = tasks
            .iter()
            .find(|t| t.id == task_id)
            .and_then(|t| t.dependencies.first().cloned())
            .unwrap_or_default();
        CoreError::CyclicDependency {
            task_id: task_id.to_string(),
            depends_on,
        }
    })?;

    let mut depth: HashMap<NodeIndex, usize> = HashMap::with_capacity(sorted.len());
    for &node in &sorted {
        let level = deps
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .filter_map(|parent| depth.get(&parent))
            .map(|d| d + 1)
            .max()
            .unwrap_or(0);
        depth.insert(node, level);
    }

    let mut keyed: Vec<(usize, i64, &str)> = sorted
        .iter()
        .map(|node| {
            let id = deps.graph[*node];
            (
                depth.get(node).copied().unwrap_or(0),
                order_index.get(id).copied().unwrap_or(0),
                id,
            )
        })
        .collect();
    keyed.sort_unstable();
    Ok(keyed.into_iter().map(|(_, _, id)| id.to_string()).collect())
}

/// Tasks that can be picked up now: pending or selected, with every
/// dependency completed or skipped.
#[must_use]
pub fn ready_tasks(tasks: &[Task]) -> Vec<&Task> {
    let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut ready: Vec<&Task> = tasks
        .iter()
        .filter(|t| {
            matches!(
                t.status,
                crate::enums::TaskStatus::Pending | crate::enums::TaskStatus::Selected
            )
        })
        .filter(|t| {
            t.dependencies.iter().all(|dep| {
                by_id
                    .get(dep.as_str())
                    .is_some_and(|d| d.status.satisfies_dependency())
            })
        })
        .collect();
    ready.sort_by(|a, b| {
        (a.priority.rank(), a.order_index).cmp(&(b.priority.rank(), b.order_index))
    });
    ready
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{Priority, TaskStatus};
    use chrono::Utc;

    fn task(id: &str, order: i64, deps: &[&str], status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            id: id.into(),
            problem_id: "prb-1".into(),
            title: id.into(),
            description: String::new(),
            spec: String::new(),
            status,
            priority: Priority::Medium,
            order_index: order,
            dependencies: deps.iter().map(|d| (*d).to_string()).collect(),
            started_at: None,
            completed_at: None,
            error_message: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn edges(pairs: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (from, to) in pairs {
            map.entry((*from).to_string())
                .or_default()
                .push((*to).to_string());
        }
        map
    }

    #[test]
    fn self_edge_is_a_cycle() {
        assert!(would_create_cycle(&HashMap::new(), "a", "a"));
    }

    #[test]
    fn closing_edge_is_detected() {
        let g = edges(&[("b", "a"), ("c", "b")]);
        assert!(would_create_cycle(&g, "a", "c"));
        assert!(!would_create_cycle(&g, "c", "a"));
        assert!(!would_create_cycle(&g, "d", "c"));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let g = edges(&[("b", "a"), ("c", "a"), ("d", "b")]);
        assert!(!would_create_cycle(&g, "d", "c"));
    }

    #[test]
    fn order_respects_dependencies_then_index() {
        let tasks = vec![
            task("t-deploy", 0, &["t-build"], TaskStatus::Pending),
            task("t-build", 5, &[], TaskStatus::Pending),
            task("t-docs", 1, &[], TaskStatus::Pending),
        ];
        let order = execution_order(&tasks).unwrap();
        assert_eq!(order, vec!["t-docs", "t-build", "t-deploy"]);
    }

    #[test]
    fn deeper_chain_waits_for_its_level() {
        let tasks = vec![
            task("t-migrate", 0, &["t-schema"], TaskStatus::Pending),
            task("t-schema", 3, &[], TaskStatus::Pending),
            task("t-seed", 1, &["t-migrate"], TaskStatus::Pending),
            task("t-lint", 9, &[], TaskStatus::Pending),
        ];
        let order = execution_order(&tasks).unwrap();
        assert_eq!(order, vec!["t-schema", "t-lint", "t-migrate", "t-seed"]);
    }

    #[test]
    fn stored_cycle_is_reported() {
        let tasks = vec![
            task("a", 0, &["b"], TaskStatus::Pending),
            task("b", 1, &["a"], TaskStatus::Pending),
        ];
        assert!(matches!(
            execution_order(&tasks),
            Err(CoreError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn ready_requires_satisfied_dependencies() {
        let tasks = vec![
            task("a", 0, &[], TaskStatus::Completed),
            task("b", 1, &["a"], TaskStatus::Pending),
            task("c", 2, &["b"], TaskStatus::Pending),
            task("d", 3, &[], TaskStatus::InProgress),
            task("e", 4, &["x"], TaskStatus::Selected),
        ];
        let ids: Vec<&str> = ready_tasks(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }
}
