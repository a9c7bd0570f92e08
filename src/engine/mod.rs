// src/engine/mod.rs

//! Rebuild orchestration engine.
//!
//! This module ties together:
//! - the task scheduler
//! - trigger batches (with the "at most one pending re-run" coalescing
//!   rule for changes that arrive while a run is in flight)
//! - the debouncer that turns raw watcher hits into settled batches
//! - the main runtime event loop that reacts to:
//!   - trigger batches (from the watcher or seeded stages)
//!   - task completion events
//!   - shutdown signals

pub mod batch;
pub mod debounce;
pub mod runtime;

use crate::errors::{BuildError, Result};
use crate::exec;
use crate::tasks::{Scheduler, TaskRegistry};

pub use batch::TriggerBatch;
pub use debounce::{spawn_debouncer, BindingHit};
pub use runtime::{
    ReloadSink, Runtime, RuntimeEvent, RuntimeOptions, TaskName, TaskOutcome,
};

use tokio::sync::mpsc;

/// A one-shot run request.
///
/// - `Task`: run one task (and whatever prerequisites it needs).
/// - `Sequence`: run each entry in listed order; a failure aborts the
///   remainder.
/// - `Group`: run all entries as one concurrent batch.
#[derive(Debug, Clone)]
pub enum Invocation {
    Task(TaskName),
    Sequence(Vec<TaskName>),
    Group(Vec<TaskName>),
}

impl Invocation {
    fn names(&self) -> Vec<&str> {
        match self {
            Invocation::Task(n) => vec![n.as_str()],
            Invocation::Sequence(v) | Invocation::Group(v) => {
                v.iter().map(|s| s.as_str()).collect()
            }
        }
    }

    /// One trigger batch per execution stage.
    fn stage_batches(self) -> Vec<TriggerBatch> {
        match self {
            Invocation::Task(n) => vec![TriggerBatch::manual(vec![n])],
            Invocation::Group(v) => vec![TriggerBatch::manual(v)],
            Invocation::Sequence(v) => v
                .into_iter()
                .map(|n| TriggerBatch::manual(vec![n]))
                .collect(),
        }
    }
}

/// Run an invocation to completion and surface the first failure.
///
/// Name resolution happens up front: an unregistered name fails with
/// [`BuildError::UnknownTask`] before any unit of work starts.
pub async fn run_invocation(registry: &TaskRegistry, invocation: Invocation) -> Result<()> {
    for name in invocation.names() {
        if !registry.contains(name) {
            return Err(BuildError::UnknownTask(name.to_string()));
        }
    }

    let mut scheduler = Scheduler::from_registry(registry)?;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let exec_tx = exec::spawn_executor(rt_tx.clone());

    let runtime = Runtime::new(
        &mut scheduler,
        RuntimeOptions {
            exit_when_idle: true,
            keep_going: false,
        },
        rt_rx,
        exec_tx,
    )
    .with_stages(invocation.stage_batches());

    runtime.run().await
}
