// src/engine/runtime.rs

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::batch::TriggerBatch;
use crate::errors::{BuildError, Result};
use crate::tasks::scheduler::{ScheduledTask, Scheduler};

/// Public type alias for task names throughout the engine.
pub type TaskName = String;

/// Result of a unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// The work's error, rendered with its context chain.
    Failed(String),
}

/// Events sent into the runtime from the debouncer, the executor, or
/// external signals.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    BatchTriggered {
        batch: TriggerBatch,
    },
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    ShutdownRequested,
}

/// Options that influence how the runtime behaves.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// If true, exit as soon as there is nothing left to run and no queued
    /// triggers. In watch mode this should be `false`.
    pub exit_when_idle: bool,

    /// If true, a failed run is logged and the loop keeps consuming
    /// events (watch mode). If false, the first failure ends the loop and
    /// is returned to the caller (one-shot mode).
    pub keep_going: bool,
}

/// Receiver for post-run browser notifications.
///
/// The watch session plugs the live-reload hub in here; tests plug in a
/// recorder.
pub trait ReloadSink: Send + Sync {
    /// `full == true` asks clients to reload the page; `false` asks for a
    /// stylesheet-only refresh.
    fn notify(&self, full: bool);
}

/// Per-run bookkeeping.
#[derive(Debug, Default)]
struct RunContext {
    /// `Some(full)` if this run should end with a reload notification.
    reload: Option<bool>,
    /// First failure observed in this run.
    first_failure: Option<(TaskName, String)>,
}

/// The main orchestration runtime.
///
/// Responsibilities:
/// - Consume `RuntimeEvent`s from the debouncer/executor/signal handler.
/// - Keep at most one run in flight; coalesce triggers that arrive while
///   a run is active into a single pending batch.
/// - Drive the scheduler and send ready tasks to the executor.
/// - Notify the reload sink after successful watch-triggered runs.
pub struct Runtime<'s> {
    scheduler: &'s mut Scheduler,
    options: RuntimeOptions,

    /// Unified event stream from all producers.
    events_rx: mpsc::Receiver<RuntimeEvent>,

    /// Channel to the executor: ready tasks are sent here.
    exec_tx: mpsc::Sender<ScheduledTask>,

    /// Seeded one-shot stages, executed in order before anything else.
    stages: VecDeque<TriggerBatch>,

    /// The single coalesced pending batch for triggers that arrived while
    /// a run was in flight.
    pending: Option<TriggerBatch>,

    current: Option<RunContext>,
    reload: Option<Arc<dyn ReloadSink>>,
    first_error: Option<BuildError>,
}

impl<'s> Runtime<'s> {
    pub fn new(
        scheduler: &'s mut Scheduler,
        options: RuntimeOptions,
        events_rx: mpsc::Receiver<RuntimeEvent>,
        exec_tx: mpsc::Sender<ScheduledTask>,
    ) -> Self {
        Self {
            scheduler,
            options,
            events_rx,
            exec_tx,
            stages: VecDeque::new(),
            pending: None,
            current: None,
            reload: None,
            first_error: None,
        }
    }

    /// Seed ordered one-shot stages (each stage is one run).
    pub fn with_stages(mut self, stages: Vec<TriggerBatch>) -> Self {
        self.stages = stages.into();
        self
    }

    pub fn with_reload_sink(mut self, sink: Arc<dyn ReloadSink>) -> Self {
        self.reload = Some(sink);
        self
    }

    /// Main event loop.
    pub async fn run(mut self) -> Result<()> {
        info!("runtime started");

        // Kick off the first seeded stage, if any.
        let mut keep_running = self.advance().await?;

        while keep_running {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            debug!(?event, "runtime received event");

            keep_running = match event {
                RuntimeEvent::BatchTriggered { batch } => self.handle_batch(batch).await?,
                RuntimeEvent::TaskCompleted { task, outcome } => {
                    self.handle_completion(task, outcome).await?
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested, stopping runtime");
                    false
                }
            };
        }

        info!("runtime exiting");
        match self.first_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Handle a trigger batch (usually from the debouncer).
    async fn handle_batch(&mut self, batch: TriggerBatch) -> Result<bool> {
        if batch.is_empty() {
            return Ok(true);
        }

        if self.scheduler.is_idle() {
            debug!(tasks = ?batch.tasks(), "batch triggered while idle");
        } else {
            debug!(tasks = ?batch.tasks(), "batch triggered while running; coalescing");
        }

        match self.pending.as_mut() {
            Some(pending) => pending.merge(batch),
            None => self.pending = Some(batch),
        }

        self.advance().await
    }

    /// Handle completion of a task's unit of work.
    async fn handle_completion(&mut self, task: TaskName, outcome: TaskOutcome) -> Result<bool> {
        match &outcome {
            TaskOutcome::Success => info!(task = %task, "task completed successfully"),
            TaskOutcome::Failed(reason) => {
                warn!(task = %task, reason = %reason, "task failed");
                if let Some(ctx) = self.current.as_mut() {
                    if ctx.first_failure.is_none() {
                        ctx.first_failure = Some((task.clone(), reason.clone()));
                    }
                }
            }
        }

        let newly_ready = self.scheduler.handle_completion(&task, &outcome);
        self.dispatch(newly_ready).await?;

        self.advance().await
    }

    /// Settle finished runs and start the next piece of work, if any.
    ///
    /// Returns `false` when the loop should stop (idle in one-shot mode,
    /// or a failure with `keep_going == false`).
    async fn advance(&mut self) -> Result<bool> {
        loop {
            if !self.scheduler.is_idle() {
                return Ok(true);
            }

            if let Some(ctx) = self.current.take() {
                if !self.finish_run(ctx) {
                    return Ok(false);
                }
            }

            let next = self
                .stages
                .pop_front()
                .or_else(|| self.pending.take());

            match next {
                Some(batch) => self.begin_run(batch).await?,
                None => return Ok(!self.options.exit_when_idle),
            }
            // Loop again: a run with no participants is already idle.
        }
    }

    /// Close out a finished run: surface failures, or notify the reload
    /// sink on success.
    fn finish_run(&mut self, ctx: RunContext) -> bool {
        if let Some((task, reason)) = ctx.first_failure {
            if self.options.keep_going {
                warn!(
                    task = %task,
                    reason = %reason,
                    "rebuild failed; previous output left in place, waiting for the next change"
                );
                return true;
            }
            self.first_error = Some(BuildError::TaskExecution {
                task,
                source: anyhow!(reason),
            });
            return false;
        }

        if let (Some(sink), Some(full)) = (self.reload.as_ref(), ctx.reload) {
            debug!(full, "notifying reload clients");
            sink.notify(full);
        }
        true
    }

    /// Start a run from the given batch.
    async fn begin_run(&mut self, batch: TriggerBatch) -> Result<()> {
        info!(tasks = ?batch.tasks(), "starting run");

        self.scheduler.start_new_run();

        let mut ctx = RunContext {
            reload: batch.reload(),
            first_failure: None,
        };

        for task in batch.tasks() {
            if !self.scheduler.contains(task) {
                warn!(task = %task, "batch references unknown task; skipping");
                continue;
            }
            let ready = self.scheduler.handle_trigger(task);
            self.dispatch(ready).await?;
        }

        if self.scheduler.is_idle() {
            // Nothing participated; don't notify anyone.
            ctx.reload = None;
        }
        self.current = Some(ctx);

        Ok(())
    }

    /// Send all ready tasks to the executor.
    async fn dispatch(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        for task in tasks {
            debug!(task = %task.name, "dispatching task to executor");
            if let Err(err) = self.exec_tx.send(task).await {
                error!(error = %err, "failed to send task to executor");
                return Err(BuildError::Other(err.into()));
            }
        }
        Ok(())
    }
}
