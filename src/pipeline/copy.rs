// src/pipeline/copy.rs

use std::fs;

use anyhow::{Context, Result};
use tracing::info;

use crate::pipeline::{util, BuildContext};

/// Copy loose source-root files (favicon, robots.txt, ...) into the final
/// output root. Page sources are excluded; they are rendered by the pages
/// pipeline instead.
pub fn run(ctx: &BuildContext) -> Result<()> {
    let src_root = ctx.source_root();
    let include = util::build_globset(&ctx.cfg.copy.watch)?;
    let exclude = if ctx.cfg.copy.exclude.is_empty() {
        None
    } else {
        Some(util::build_globset(&ctx.cfg.copy.exclude)?)
    };
    let files = util::collect_matching_files(&src_root, &include, exclude.as_ref())?;

    let out_dir = ctx.final_out();
    let mut copied = 0usize;

    for file in &files {
        let rel = file.strip_prefix(&src_root).unwrap_or(file);
        let dest = out_dir.join(rel);
        util::ensure_parent_dir(&dest)?;
        fs::copy(file, &dest)
            .with_context(|| format!("copying {:?} to {:?}", file, dest))?;
        copied += 1;
    }

    info!(copied, dest = ?out_dir, "copy finished");
    Ok(())
}
