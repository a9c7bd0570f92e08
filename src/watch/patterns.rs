// src/watch/patterns.rs

use std::fmt;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::{ConfigFile, Mode, StyleReload};
use crate::engine::TaskName;
use crate::errors::{BuildError, Result};

/// How browsers should be told about a change processed through a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadKind {
    /// Structural change: reload the whole page.
    Full,
    /// Style-only change: hot-swap stylesheets without navigation.
    Inject,
}

impl ReloadKind {
    pub fn is_full(self) -> bool {
        matches!(self, ReloadKind::Full)
    }
}

/// Raw binding specification before glob compilation.
#[derive(Debug, Clone)]
pub struct RawBindingSpec {
    pub task: TaskName,
    pub reload: ReloadKind,
    pub watch: Vec<String>,
    pub exclude: Vec<String>,
}

/// Compiled watch/exclude glob patterns bound to one task.
///
/// Patterns are relative to the source root; the watcher passes relative
/// paths (e.g. `"styles/main.css"`) into `matches`.
#[derive(Clone)]
pub struct WatchBinding {
    task: TaskName,
    reload: ReloadKind,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("task", &self.task)
            .field("reload", &self.reload)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    /// Name of the task this binding invokes.
    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn reload(&self) -> ReloadKind {
        self.reload
    }

    /// Returns true if this binding is interested in the given path
    /// (relative to the source root).
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Compile one binding per spec.
///
/// Invalid patterns surface as [`BuildError::WatchSetup`], before the
/// watcher starts.
pub fn build_bindings(specs: &[RawBindingSpec]) -> Result<Vec<WatchBinding>> {
    let mut bindings = Vec::with_capacity(specs.len());

    for spec in specs {
        let watch_set = build_globset(&spec.watch, &spec.task)?;
        let exclude_set = if spec.exclude.is_empty() {
            None
        } else {
            Some(build_globset(&spec.exclude, &spec.task)?)
        };

        bindings.push(WatchBinding {
            task: spec.task.clone(),
            reload: spec.reload,
            watch_set,
            exclude_set,
        });
    }

    Ok(bindings)
}

/// The default binding table: one binding per pipeline, with the reload
/// kind the change class calls for. Style changes inject; everything else
/// is structural and reloads the page.
///
/// Under production mode the style binding honours
/// `watch.production_style_reload`.
pub fn default_binding_specs(cfg: &ConfigFile, mode: Mode) -> Vec<RawBindingSpec> {
    let style_reload = match (mode, cfg.watch.production_style_reload) {
        (Mode::Production, StyleReload::Full) => ReloadKind::Full,
        _ => ReloadKind::Inject,
    };

    vec![
        RawBindingSpec {
            task: "styles".into(),
            reload: style_reload,
            watch: cfg.styles.watch.clone(),
            exclude: Vec::new(),
        },
        RawBindingSpec {
            task: "scripts".into(),
            reload: ReloadKind::Full,
            watch: cfg.scripts.watch.clone(),
            exclude: Vec::new(),
        },
        RawBindingSpec {
            task: "images".into(),
            reload: ReloadKind::Full,
            watch: cfg.images.watch.clone(),
            exclude: Vec::new(),
        },
        RawBindingSpec {
            task: "fonts".into(),
            reload: ReloadKind::Full,
            watch: cfg.fonts.watch.clone(),
            exclude: Vec::new(),
        },
        RawBindingSpec {
            task: "pages".into(),
            reload: ReloadKind::Full,
            watch: cfg.pages.watch.clone(),
            exclude: Vec::new(),
        },
        RawBindingSpec {
            task: "copy".into(),
            reload: ReloadKind::Full,
            watch: cfg.copy.watch.clone(),
            exclude: cfg.copy.exclude.clone(),
        },
    ]
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String], task: &str) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|e| {
            BuildError::WatchSetup(format!(
                "invalid glob pattern for task '{task}': {pat}: {e}"
            ))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| BuildError::WatchSetup(format!("building globset for task '{task}': {e}")))
}
