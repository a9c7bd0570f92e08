// src/tasks/graph.rs

use std::collections::BTreeMap;

use crate::tasks::registry::{Deps, TaskRegistry};

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct TaskNode {
    /// Direct dependencies: tasks that must complete before this one runs.
    deps: Vec<String>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<String>,
}

/// Simple in-memory dependency graph keyed by task name.
///
/// Built by desugaring the registry's [`Deps`] declarations:
///
/// - `Parallel([a, b])` on task `t` adds edges `a -> t` and `b -> t`.
/// - `Sequential([a, b])` on task `t` additionally chains `a -> b`, so the
///   listed order becomes an ordering constraint of the graph itself.
///
/// Acyclicity is checked in `registry::validate`; here we only keep
/// adjacency information for scheduling.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: BTreeMap<String, TaskNode>,
}

impl TaskGraph {
    /// Build the graph from a registry.
    ///
    /// Unknown names referenced by `Sequential` chains are ignored here;
    /// the registry rejects them during validation.
    pub fn from_registry(registry: &TaskRegistry) -> Self {
        let mut nodes: BTreeMap<String, TaskNode> = BTreeMap::new();

        for (name, _) in registry.iter() {
            nodes.insert(name.clone(), TaskNode::default());
        }

        for (name, spec) in registry.iter() {
            for dep in spec.deps.names() {
                add_edge(&mut nodes, dep, name);
            }
            if let Deps::Sequential(list) = &spec.deps {
                for pair in list.windows(2) {
                    add_edge(&mut nodes, &pair[0], &pair[1]);
                }
            }
        }

        Self { nodes }
    }

    /// Return all task names.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}

fn add_edge(nodes: &mut BTreeMap<String, TaskNode>, from: &str, to: &str) {
    if !nodes.contains_key(from) {
        return;
    }
    if let Some(node) = nodes.get_mut(to) {
        if !node.deps.iter().any(|d| d == from) {
            node.deps.push(from.to_string());
        }
    } else {
        return;
    }
    if let Some(node) = nodes.get_mut(from) {
        if !node.dependents.iter().any(|d| d == to) {
            node.dependents.push(to.to_string());
        }
    }
}
