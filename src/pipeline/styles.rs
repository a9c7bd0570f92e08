// src/pipeline/styles.rs

use std::fs;

use anyhow::{anyhow, Context, Result};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use tracing::info;

use crate::config::Mode;
use crate::pipeline::{util, BuildContext};

/// Compile every stylesheet matching the styles glob into the staged
/// output root, minified under production mode.
pub fn run(ctx: &BuildContext) -> Result<()> {
    let src_root = ctx.source_root();
    let include = util::build_globset(&ctx.cfg.styles.watch)?;
    let files = util::collect_matching_files(&src_root, &include, None)?;

    let out_dir = ctx.staged_out().join(&ctx.cfg.styles.dest);
    let mut written = 0usize;

    for file in &files {
        let source = fs::read_to_string(file)
            .with_context(|| format!("reading stylesheet {:?}", file))?;
        let compiled = transform_css(&source, ctx.mode)
            .with_context(|| format!("compiling stylesheet {:?}", file))?;

        let rel = file.strip_prefix(&src_root).unwrap_or(file);
        let dest = out_dir.join(util::strip_top_component(rel));
        util::ensure_parent_dir(&dest)?;
        fs::write(&dest, compiled).with_context(|| format!("writing stylesheet {:?}", dest))?;
        written += 1;
    }

    info!(written, dest = ?out_dir, "styles finished");
    Ok(())
}

/// Parse and re-print one stylesheet. A malformed input is a task
/// failure.
fn transform_css(source: &str, mode: Mode) -> Result<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| anyhow!("parse error: {e}"))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: mode.is_production(),
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("print error: {e}"))?;
    Ok(result.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_output_is_minified() {
        let css = ".button {\n  color: #ff0000;\n}\n";
        let dev = transform_css(css, Mode::Development).unwrap();
        let prod = transform_css(css, Mode::Production).unwrap();

        assert!(dev.contains(".button"));
        assert!(prod.len() < dev.len());
        assert!(!prod.contains('\n'));
    }
}
