// src/tasks/scheduler.rs

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::engine::{TaskName, TaskOutcome};
use crate::errors::Result;
use crate::tasks::graph::TaskGraph;
use crate::tasks::registry::{TaskRegistry, Work};

/// Per-run state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    /// Task participates in this run but is waiting on prerequisites.
    Pending,
    /// Task has been dispatched to the executor and is currently running.
    Running,
    /// Task completed successfully in this run.
    DoneSuccess,
    /// Task failed in this run (or was blocked by a failed prerequisite).
    DoneFailed,
}

/// Static task information plus per-run state.
#[derive(Clone)]
struct TaskState {
    name: TaskName,
    work: Work,
    /// Direct prerequisites from the dependency graph.
    deps: Vec<TaskName>,

    /// Per-run state (`None` if not participating in the current run).
    run_state: Option<RunState>,

    /// Last run ID in which this task succeeded.
    ///
    /// A prerequisite that is not participating in the current run counts
    /// as satisfied iff it has a recorded success. This is what keeps a
    /// `clean` prerequisite from re-wiping the output tree on every
    /// incremental rebuild: it runs in the first run of the session, and
    /// later runs see its history.
    last_successful_run: Option<u64>,

    /// Last run ID in which this task failed.
    last_failed_run: Option<u64>,
}

/// A task the scheduler wants the executor to run now.
#[derive(Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub work: Work,
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ScheduledTask {
    fn from_state(state: &TaskState) -> Self {
        Self {
            name: state.name.clone(),
            work: state.work.clone(),
        }
    }
}

/// Scheduler holds the immutable dependency graph plus mutable per-run
/// state.
///
/// It is responsible for:
/// - remembering which tasks are part of the current run
/// - deciding when a triggered task is ready to run (prerequisites
///   satisfied)
/// - marking tasks as succeeded/failed
/// - scheduling dependents when appropriate
/// - failing dependents when a task fails
pub struct Scheduler {
    graph: TaskGraph,
    tasks: HashMap<TaskName, TaskState>,

    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
}

impl Scheduler {
    /// Construct a scheduler from a registry, validating it first.
    pub fn from_registry(registry: &TaskRegistry) -> Result<Self> {
        registry.validate()?;

        let graph = TaskGraph::from_registry(registry);
        let mut tasks = HashMap::new();

        for (name, spec) in registry.iter() {
            let deps = graph.dependencies_of(name).to_vec();
            tasks.insert(
                name.clone(),
                TaskState {
                    name: name.clone(),
                    work: spec.work.clone(),
                    deps,
                    run_state: None,
                    last_successful_run: None,
                    last_failed_run: None,
                },
            );
        }

        Ok(Self {
            graph,
            tasks,
            run_counter: 0,
            current_run_id: None,
        })
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Start a new run, resetting per-run state but keeping historical
    /// success information for prerequisite satisfaction on later runs.
    pub fn start_new_run(&mut self) {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);

        for state in self.tasks.values_mut() {
            state.run_state = None;
        }

        debug!(run_id = self.run_counter, "scheduler: starting new run");
    }

    /// Handle a trigger for a task name.
    ///
    /// The triggered task joins the current run, along with every
    /// prerequisite (transitively) that has never succeeded in this
    /// process: a run must bootstrap its own prerequisites or it would
    /// wait on them forever.
    ///
    /// Returns the tasks that are now ready to be executed.
    pub fn handle_trigger(&mut self, task: &str) -> Vec<ScheduledTask> {
        if self.current_run_id.is_none() {
            warn!("handle_trigger called with no active run; implicitly starting a new run");
            self.start_new_run();
        }

        if !self.tasks.contains_key(task) {
            warn!(task = %task, "trigger for unknown task; ignoring");
            return Vec::new();
        }

        self.mark_pending_with_unmet_deps(task);

        let ready = self.collect_new_ready_tasks();
        self.maybe_finish_run();
        ready
    }

    /// Handle completion of a task's unit of work.
    ///
    /// - On success, mark it `DoneSuccess`, record history, and schedule
    ///   dependents where possible.
    /// - On failure, mark it `DoneFailed` and fail all triggered
    ///   dependents in this run.
    pub fn handle_completion(&mut self, task: &str, outcome: &TaskOutcome) -> Vec<ScheduledTask> {
        let run_id = match self.current_run_id {
            Some(id) => id,
            None => {
                warn!(task = %task, "handle_completion called with no active run; ignoring");
                return Vec::new();
            }
        };

        let mut newly_ready = Vec::new();

        match self.tasks.get_mut(task) {
            Some(state) => match outcome {
                TaskOutcome::Success => {
                    state.run_state = Some(RunState::DoneSuccess);
                    state.last_successful_run = Some(run_id);
                    debug!(task = %state.name, "task completed successfully");
                    newly_ready.extend(self.collect_new_ready_tasks());
                }
                TaskOutcome::Failed(reason) => {
                    state.run_state = Some(RunState::DoneFailed);
                    state.last_failed_run = Some(run_id);
                    warn!(
                        task = %state.name,
                        reason = %reason,
                        "task failed; failing dependents in this run"
                    );
                    self.mark_dependents_failed(task);
                }
            },
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
            }
        }

        self.maybe_finish_run();
        newly_ready
    }

    /// Mark a task `Pending`, pulling in any prerequisite that is neither
    /// participating in this run nor satisfied by history.
    fn mark_pending_with_unmet_deps(&mut self, task: &str) {
        let mut stack = vec![task.to_string()];

        while let Some(name) = stack.pop() {
            let Some(state) = self.tasks.get_mut(&name) else {
                continue;
            };
            if state.run_state.is_some() {
                // Already part of this run; ignore duplicate trigger.
                debug!(task = %name, "task already participating in current run");
                continue;
            }
            state.run_state = Some(RunState::Pending);
            debug!(task = %name, "task marked as Pending in this run");

            let deps = state.deps.clone();
            for dep in deps {
                if let Some(dep_state) = self.tasks.get(&dep) {
                    if dep_state.run_state.is_none() && dep_state.last_successful_run.is_none() {
                        stack.push(dep);
                    }
                }
            }
        }
    }

    /// Determine whether all tasks are in a terminal state and clear
    /// `current_run_id` if so.
    fn maybe_finish_run(&mut self) {
        if self.current_run_id.is_none() {
            return;
        }

        let any_active = self.tasks.values().any(|state| {
            matches!(
                state.run_state,
                Some(RunState::Pending) | Some(RunState::Running)
            )
        });

        if !any_active {
            info!(
                run_id = self.current_run_id,
                "scheduler: all tasks terminal; run finished"
            );
            self.current_run_id = None;
        }
    }

    /// Collect tasks that are `Pending` with satisfied prerequisites, mark
    /// them `Running`, and return them as `ScheduledTask`s.
    fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        let mut ready = Vec::new();

        // Decide first, then mutate, to avoid borrowing conflicts.
        let candidates: Vec<TaskName> = self
            .tasks
            .values()
            .filter_map(|state| {
                if matches!(state.run_state, Some(RunState::Pending))
                    && self.deps_satisfied(state)
                {
                    Some(state.name.clone())
                } else {
                    None
                }
            })
            .collect();

        for name in candidates {
            if let Some(state) = self.tasks.get_mut(&name) {
                debug!(task = %state.name, "prerequisites satisfied; marking Running");
                state.run_state = Some(RunState::Running);
                ready.push(ScheduledTask::from_state(state));
            }
        }

        ready
    }

    /// Check whether all prerequisites of the given task are satisfied for
    /// the current run.
    ///
    /// A prerequisite is satisfied if:
    /// - in this run its state is `DoneSuccess`, OR
    /// - it is not part of this run and has a recorded success from a
    ///   previous run.
    fn deps_satisfied(&self, state: &TaskState) -> bool {
        for dep_name in &state.deps {
            let dep = match self.tasks.get(dep_name) {
                Some(d) => d,
                None => {
                    warn!(task = %state.name, dep = %dep_name, "prerequisite missing from task map");
                    return false;
                }
            };

            match dep.run_state {
                Some(RunState::DoneSuccess) => {}
                Some(RunState::DoneFailed) => return false,
                Some(RunState::Pending) | Some(RunState::Running) => return false,
                None => {
                    if dep.last_successful_run.is_none() {
                        return false;
                    }
                }
            }
        }

        true
    }

    /// Mark all triggered dependents (transitively) of a failed task as
    /// `DoneFailed` for this run, so nothing downstream of a failure ever
    /// starts.
    fn mark_dependents_failed(&mut self, failed_task: &str) {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed_task).to_vec();

        while let Some(name) = stack.pop() {
            if let Some(state) = self.tasks.get_mut(&name) {
                match state.run_state {
                    Some(RunState::Pending) | Some(RunState::Running) => {
                        state.run_state = Some(RunState::DoneFailed);
                        debug!(
                            task = %state.name,
                            "marking dependent as DoneFailed due to upstream failure"
                        );
                        stack.extend(self.graph.dependents_of(&name).iter().cloned());
                    }
                    Some(RunState::DoneSuccess) | Some(RunState::DoneFailed) | None => {}
                }
            }
        }
    }
}
