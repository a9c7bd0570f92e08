// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::BindingHit;
use crate::errors::{BuildError, Result};
use crate::watch::patterns::WatchBinding;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher observing `root` recursively; every changed
/// path is matched against the bindings and each match is forwarded to
/// the debouncer as a [`BindingHit`].
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Vec<WatchBinding>,
    hits_tx: mpsc::Sender<BindingHit>,
) -> Result<WatcherHandle> {
    let root = root.into();
    if !root.is_dir() {
        return Err(BuildError::WatchSetup(format!(
            "watch root {:?} is not a directory",
            root
        )));
    }
    let root = root.canonicalize().unwrap_or_else(|_| root.clone()); // best-effort

    let bindings = Arc::new(bindings);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        {
            let event_tx = event_tx.clone();
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Err(err) = event_tx.send(event) {
                        // tracing isn't reliable inside the notify thread.
                        eprintln!("sitebuild: failed to forward notify event: {err}");
                    }
                }
                Err(err) => {
                    eprintln!("sitebuild: file watch error: {err}");
                }
            }
        },
        Config::default(),
    )
    .map_err(|e| BuildError::WatchSetup(e.to_string()))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| BuildError::WatchSetup(format!("watching {:?}: {e}", root)))?;

    info!("file watcher started on {:?}", root);

    // Async task that consumes notify events and forwards binding hits.
    let async_root = root.clone();
    let async_bindings = Arc::clone(&bindings);
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            debug!("received notify event: {:?}", event);

            for path in &event.paths {
                let Some(rel_str) = relative_str(&async_root, path) else {
                    debug!(
                        "ignoring path {:?} outside watch root {:?}",
                        path, async_root
                    );
                    continue;
                };

                for binding in async_bindings.iter() {
                    if binding.matches(&rel_str) {
                        debug!(
                            task = %binding.task(),
                            path = %rel_str,
                            "watch match -> binding hit"
                        );
                        let hit = BindingHit {
                            task: binding.task().to_string(),
                            full_reload: binding.reload().is_full(),
                            path: rel_str.clone(),
                        };
                        if let Err(err) = hits_tx.send(hit).await {
                            warn!("failed to send binding hit: {err}");
                            // If the debouncer is gone, there's no point
                            // keeping the watcher loop alive.
                            return;
                        }
                    }
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if the path is not under `root`.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let s = rel.to_string_lossy().replace('\\', "/");
    Some(s)
}
