// src/engine/debounce.rs

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::engine::batch::TriggerBatch;
use crate::engine::runtime::{RuntimeEvent, TaskName};

/// One watcher match: a settled filesystem change mapped to its bound task.
#[derive(Debug, Clone)]
pub struct BindingHit {
    pub task: TaskName,
    pub full_reload: bool,
    /// Relative path that matched, for logging.
    pub path: String,
}

/// Spawn the debouncer loop.
///
/// Raw hits stream in from the watcher; after `quiet` with no further
/// hits, everything collected so far is flushed to the runtime as a
/// single [`TriggerBatch`]. A burst of editor events for one save
/// therefore produces one batch, and simultaneous changes to several
/// bindings coalesce into one run.
pub fn spawn_debouncer(
    quiet: Duration,
    mut hits_rx: mpsc::Receiver<BindingHit>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(hit) = hits_rx.recv().await {
            debug!(task = %hit.task, path = %hit.path, "change detected; debouncing");
            let mut batch = TriggerBatch::from_watch(hit.task, hit.full_reload);

            // Keep absorbing hits until the quiet period elapses.
            loop {
                match timeout(quiet, hits_rx.recv()).await {
                    Ok(Some(hit)) => {
                        debug!(task = %hit.task, path = %hit.path, "change absorbed into batch");
                        batch.record(hit.task, hit.full_reload);
                    }
                    Ok(None) => {
                        // Watcher gone; flush what we have and stop.
                        let _ = runtime_tx
                            .send(RuntimeEvent::BatchTriggered { batch })
                            .await;
                        debug!("debouncer input closed");
                        return;
                    }
                    Err(_elapsed) => break,
                }
            }

            if let Err(err) = runtime_tx
                .send(RuntimeEvent::BatchTriggered { batch })
                .await
            {
                warn!("failed to send trigger batch to runtime: {err}");
                return;
            }
        }

        debug!("debouncer loop ended");
    })
}
