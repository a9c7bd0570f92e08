// src/tasks/registry.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::engine::TaskName;
use crate::errors::{BuildError, Result};
use crate::tasks::graph::TaskGraph;

/// A unit of work. Runs on a blocking worker thread; the result is the
/// task's completion signal.
pub type Work = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Prerequisite declaration for a task.
///
/// The ordering contract is part of the type:
///
/// - `Sequential`: prerequisites complete one after another, in listed
///   order, before the task's own unit of work runs. A failure aborts the
///   remainder of the chain.
/// - `Parallel`: prerequisites all start concurrently; the task runs once
///   every one of them has completed.
#[derive(Debug, Clone)]
pub enum Deps {
    Sequential(Vec<TaskName>),
    Parallel(Vec<TaskName>),
}

impl Deps {
    /// No prerequisites.
    pub fn none() -> Self {
        Deps::Parallel(Vec::new())
    }

    pub fn sequential<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Deps::Sequential(names.into_iter().map(Into::into).collect())
    }

    pub fn parallel<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Deps::Parallel(names.into_iter().map(Into::into).collect())
    }

    /// All referenced task names, in declaration order.
    pub fn names(&self) -> &[TaskName] {
        match self {
            Deps::Sequential(v) | Deps::Parallel(v) => v,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

/// A registered task: a name, a unit of work, prerequisites, and the
/// final-artifact flag.
///
/// The `production` flag never influences ordering; registration sites use
/// it to decide which output root the unit of work targets.
#[derive(Clone)]
pub struct TaskSpec {
    pub name: TaskName,
    pub deps: Deps,
    pub production: bool,
    pub work: Work,
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("production", &self.production)
            .finish_non_exhaustive()
    }
}

/// Convenience constructor for a [`TaskSpec`].
pub fn task<N, F>(name: N, deps: Deps, production: bool, work: F) -> TaskSpec
where
    N: Into<TaskName>,
    F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
{
    TaskSpec {
        name: name.into(),
        deps,
        production,
        work: Arc::new(work),
    }
}

/// Immutable mapping from task name to task spec.
///
/// Populated once at startup; the scheduler and the watch bindings only
/// ever read from it afterwards.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, TaskSpec>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. Fails with [`BuildError::DuplicateTask`] if the name is
    /// already registered.
    pub fn register(&mut self, spec: TaskSpec) -> Result<()> {
        if self.tasks.contains_key(&spec.name) {
            return Err(BuildError::DuplicateTask(spec.name));
        }
        self.tasks.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaskName, &TaskSpec)> {
        self.tasks.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Semantic validation of the whole registry:
    /// - every prerequisite refers to a registered task
    /// - no task depends on itself
    /// - the derived dependency graph has no cycles
    ///
    /// Runs before any unit of work starts.
    pub fn validate(&self) -> Result<()> {
        for (name, spec) in self.tasks.iter() {
            for dep in spec.deps.names() {
                if !self.tasks.contains_key(dep) {
                    return Err(BuildError::UnknownTask(format!(
                        "{dep} (prerequisite of '{name}')"
                    )));
                }
                if dep == name {
                    return Err(BuildError::Config(format!(
                        "task '{name}' cannot depend on itself"
                    )));
                }
            }
        }

        self.validate_acyclic()
    }

    fn validate_acyclic(&self) -> Result<()> {
        let graph = TaskGraph::from_registry(self);
        let names: Vec<String> = graph.tasks().map(|s| s.to_string()).collect();

        // Edge direction: dep -> task. A topological sort fails iff there
        // is a cycle.
        let mut check: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in &names {
            check.add_node(name.as_str());
        }
        for name in &names {
            for dep in graph.dependencies_of(name) {
                check.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        match toposort(&check, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(BuildError::Config(format!(
                "cycle detected in task dependencies involving task '{}'",
                cycle.node_id()
            ))),
        }
    }
}
