// src/pipeline/clean.rs

use std::fs;
use std::io::ErrorKind;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::pipeline::BuildContext;

/// Remove all build output.
///
/// The scheduler guarantees this completes before any writer starts;
/// everything that produces output declares `clean` as a prerequisite.
pub fn run(ctx: &BuildContext) -> Result<()> {
    let mut removed = 0usize;

    for dir in [ctx.dev_out(), ctx.prod_out()] {
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                debug!(?dir, "removed output directory");
                removed += 1;
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("removing output directory {:?}", dir));
            }
        }
    }

    info!(removed, "clean finished");
    Ok(())
}
