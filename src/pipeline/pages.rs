// src/pipeline/pages.rs

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::pipeline::{util, BuildContext};

/// `@@include("relative/path.html")`, resolved against the partials
/// directory.
const INCLUDE_OPEN: &str = "@@include(\"";

/// Guard against partials including each other forever.
const MAX_INCLUDE_DEPTH: usize = 10;

/// Render page sources into the staged output root.
///
/// Every page has its include directives expanded recursively; afterwards
/// a table-of-contents index is generated, unless the project ships its
/// own index page.
pub fn run(ctx: &BuildContext) -> Result<()> {
    let pages_dir = ctx.source_root().join(&ctx.cfg.pages.pages_dir);
    let partials_dir = ctx.source_root().join(&ctx.cfg.pages.partials_dir);
    let out_dir = ctx.staged_out();

    if !pages_dir.is_dir() {
        info!(?pages_dir, "no pages directory; nothing to render");
        return Ok(());
    }

    let include = util::build_globset(&["**/*.html".to_string()])?;
    let files = util::collect_matching_files(&pages_dir, &include, None)?;

    let mut rendered: Vec<String> = Vec::new();

    for file in &files {
        let source =
            fs::read_to_string(file).with_context(|| format!("reading page {:?}", file))?;
        let expanded = expand_includes(&source, &partials_dir, 0)
            .with_context(|| format!("rendering page {:?}", file))?;

        let rel = file.strip_prefix(&pages_dir).unwrap_or(file);
        let dest = out_dir.join(rel);
        util::ensure_parent_dir(&dest)?;
        fs::write(&dest, expanded).with_context(|| format!("writing page {:?}", dest))?;

        if let Some(rel_str) = util::rel_str(&pages_dir, file) {
            rendered.push(rel_str);
        }
    }

    if !rendered.iter().any(|p| p == "index.html") {
        let toc = render_toc(&rendered);
        let dest = out_dir.join("index.html");
        util::ensure_parent_dir(&dest)?;
        fs::write(&dest, toc).context("writing generated index page")?;
        debug!("generated table-of-contents index");
    }

    info!(pages = rendered.len(), dest = ?out_dir, "pages finished");
    Ok(())
}

/// Expand `@@include("...")` directives against the partials directory.
///
/// Partials may include other partials; a missing partial or a cycle
/// deeper than [`MAX_INCLUDE_DEPTH`] fails the task.
fn expand_includes(source: &str, partials_dir: &Path, depth: usize) -> Result<String> {
    if depth > MAX_INCLUDE_DEPTH {
        bail!("include nesting deeper than {MAX_INCLUDE_DEPTH} levels (cycle?)");
    }

    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find(INCLUDE_OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + INCLUDE_OPEN.len()..];

        let Some(name_end) = after.find('"') else {
            bail!("unterminated @@include directive");
        };
        let name = &after[..name_end];

        let tail = &after[name_end + 1..];
        let Some(close) = tail.find(')') else {
            bail!("missing closing parenthesis in @@include directive");
        };

        let partial_path = partials_dir.join(name);
        let partial = fs::read_to_string(&partial_path)
            .with_context(|| format!("reading partial {:?}", partial_path))?;
        out.push_str(&expand_includes(&partial, partials_dir, depth + 1)?);

        rest = &tail[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Minimal listing page linking every rendered page.
fn render_toc(pages: &[String]) -> String {
    let mut items = String::new();
    for page in pages {
        items.push_str(&format!("    <li><a href=\"{page}\">{page}</a></li>\n"));
    }

    format!(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>Pages</title></head>\n<body>\n  <h1>Pages</h1>\n  <ul>\n{items}  </ul>\n</body>\n</html>\n"
    )
}
