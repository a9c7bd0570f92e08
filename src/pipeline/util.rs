// src/pipeline/util.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Walk `root` and collect every file whose root-relative path matches
/// `include` (and does not match `exclude`). Returns a sorted list so
/// downstream transforms are deterministic.
///
/// A missing root yields an empty set: a starter project without, say, a
/// fonts directory is not an error.
pub fn collect_matching_files(
    root: &Path,
    include: &GlobSet,
    exclude: Option<&GlobSet>,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if !root.is_dir() {
        return Ok(files);
    }

    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries =
            fs::read_dir(&dir).with_context(|| format!("reading directory {:?}", dir))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                if let Some(rel) = rel_str(root, &path) {
                    if include.is_match(&rel) && !exclude.is_some_and(|ex| ex.is_match(&rel)) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Root-relative path with forward slashes, or `None` if `path` is not
/// under `root`.
pub fn rel_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// Relative path with the leading directory component removed, so
/// `styles/components/_button.css` lands at `components/_button.css`
/// under the pipeline's destination directory.
pub fn strip_top_component(rel: &Path) -> PathBuf {
    let mut components = rel.components();
    let first = components.next();
    let rest: PathBuf = components.collect();
    if rest.as_os_str().is_empty() {
        match first {
            Some(c) => PathBuf::from(c.as_os_str()),
            None => PathBuf::new(),
        }
    } else {
        rest
    }
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {:?}", parent))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_top_component_drops_the_pipeline_dir() {
        assert_eq!(
            strip_top_component(Path::new("styles/components/_a.css")),
            PathBuf::from("components/_a.css")
        );
        assert_eq!(strip_top_component(Path::new("main.css")), PathBuf::from("main.css"));
    }

    #[test]
    fn collect_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("scripts/vendor")).unwrap();
        fs::write(root.join("scripts/b.js"), "b").unwrap();
        fs::write(root.join("scripts/a.js"), "a").unwrap();
        fs::write(root.join("scripts/vendor/c.js"), "c").unwrap();
        fs::write(root.join("scripts/readme.txt"), "x").unwrap();

        let include = build_globset(&["scripts/**/*.js".to_string()]).unwrap();
        let files = collect_matching_files(root, &include, None).unwrap();
        let rels: Vec<String> = files.iter().filter_map(|f| rel_str(root, f)).collect();

        assert_eq!(rels, vec!["scripts/a.js", "scripts/b.js", "scripts/vendor/c.js"]);
    }

    #[test]
    fn missing_root_is_empty_not_an_error() {
        let include = build_globset(&["**/*".to_string()]).unwrap();
        let files =
            collect_matching_files(Path::new("/nonexistent/sitebuild"), &include, None).unwrap();
        assert!(files.is_empty());
    }
}
