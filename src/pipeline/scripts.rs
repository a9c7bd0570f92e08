// src/pipeline/scripts.rs

use std::fs;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::pipeline::{util, BuildContext};

/// Concatenate every script matching the scripts glob into one bundle,
/// minified under production mode. Concatenation order is the sorted
/// relative path order, so builds are reproducible.
pub fn run(ctx: &BuildContext) -> Result<()> {
    let src_root = ctx.source_root();
    let include = util::build_globset(&ctx.cfg.scripts.watch)?;
    let files = util::collect_matching_files(&src_root, &include, None)?;

    if files.is_empty() {
        info!("no scripts found; nothing to bundle");
        return Ok(());
    }

    let mut bundle = String::new();
    for file in &files {
        let source =
            fs::read_to_string(file).with_context(|| format!("reading script {:?}", file))?;
        bundle.push_str(&source);
        if !source.ends_with('\n') {
            bundle.push('\n');
        }
    }

    let output = if ctx.mode.is_production() {
        minify_js(&bundle).ok_or_else(|| anyhow!("script bundle failed to parse"))?
    } else {
        bundle
    };

    let dest = ctx
        .staged_out()
        .join(&ctx.cfg.scripts.dest)
        .join(&ctx.cfg.scripts.bundle);
    util::ensure_parent_dir(&dest)?;
    fs::write(&dest, output).with_context(|| format!("writing bundle {:?}", dest))?;

    info!(sources = files.len(), dest = ?dest, "scripts finished");
    Ok(())
}

/// Minify JavaScript source code.
fn minify_js(source: &str) -> Option<String> {
    use oxc::allocator::Allocator;
    use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
    use oxc::mangler::MangleOptions;
    use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
    use oxc::parser::Parser;
    use oxc::span::SourceType;

    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return None;
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Some(code)
}
