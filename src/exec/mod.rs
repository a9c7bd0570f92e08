// src/exec/mod.rs

//! Task execution layer.
//!
//! Units of work are synchronous closures (the output pipelines do plain
//! filesystem and codec work), so each one runs on a blocking worker via
//! `spawn_blocking`. Completion is reported back to the orchestration
//! runtime as a `RuntimeEvent`, the same way for every task: the runtime
//! cannot tell an output pipeline from any other unit of work.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::tasks::scheduler::ScheduledTask;

/// Spawn the background executor loop.
///
/// The returned sender is what the runtime uses as `exec_tx`. Each
/// scheduled task runs in its own Tokio task, so members of a parallel
/// group genuinely execute concurrently.
pub fn spawn_executor(runtime_tx: mpsc::Sender<RuntimeEvent>) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        debug!("executor loop started");
        while let Some(task) = rx.recv().await {
            let runtime_tx = runtime_tx.clone();
            tokio::spawn(async move {
                run_task(task, runtime_tx).await;
            });
        }
        debug!("executor loop finished (channel closed)");
    });

    tx
}

/// Run a single unit of work and emit a `TaskCompleted` event.
///
/// A panicking unit of work is reported as a failure rather than taking
/// the process down.
async fn run_task(task: ScheduledTask, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    info!(task = %task.name, "starting task");
    let started = Instant::now();

    let work = Arc::clone(&task.work);
    let outcome = match tokio::task::spawn_blocking(move || work()).await {
        Ok(Ok(())) => TaskOutcome::Success,
        Ok(Err(err)) => TaskOutcome::Failed(format!("{err:#}")),
        Err(join_err) => TaskOutcome::Failed(format!("unit of work panicked: {join_err}")),
    };

    match &outcome {
        TaskOutcome::Success => {
            info!(task = %task.name, elapsed = ?started.elapsed(), "task finished");
        }
        TaskOutcome::Failed(reason) => {
            warn!(task = %task.name, reason = %reason, "task errored");
        }
    }

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            outcome,
        })
        .await
    {
        error!(task = %task.name, "failed to report task completion: {err}");
    }
}
