// src/pipeline/fonts.rs

use std::fs;

use anyhow::{Context, Result};
use tracing::info;

use crate::pipeline::{util, BuildContext};

/// Copy font files into the final output root.
pub fn run(ctx: &BuildContext) -> Result<()> {
    let src_root = ctx.source_root();
    let include = util::build_globset(&ctx.cfg.fonts.watch)?;
    let files = util::collect_matching_files(&src_root, &include, None)?;

    let out_dir = ctx.final_out().join(&ctx.cfg.fonts.dest);
    let mut copied = 0usize;

    for file in &files {
        let rel = file.strip_prefix(&src_root).unwrap_or(file);
        let dest = out_dir.join(util::strip_top_component(rel));
        util::ensure_parent_dir(&dest)?;
        fs::copy(file, &dest)
            .with_context(|| format!("copying font {:?} to {:?}", file, dest))?;
        copied += 1;
    }

    info!(copied, dest = ?out_dir, "fonts finished");
    Ok(())
}
