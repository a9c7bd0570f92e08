// src/pipeline/mod.rs

//! Output pipelines: the units of work behind the default task graph.
//!
//! Each pipeline reads a declared source glob, applies its transform
//! chain, and writes into the mode-resolved output root. From the
//! runner's point of view a pipeline is indistinguishable from any other
//! unit of work: a closure returning `Result<(), anyhow::Error>`.

pub mod cache;
pub mod clean;
pub mod copy;
pub mod fonts;
pub mod images;
pub mod pages;
pub mod scripts;
pub mod styles;
pub mod util;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{ConfigFile, Mode};
use crate::errors::Result;
use crate::tasks::{task, Deps, TaskRegistry};

/// Everything a pipeline needs to locate its inputs and outputs.
///
/// The build mode is carried explicitly; nothing in the pipelines reads
/// ambient process state.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Project root: the directory the config file lives in.
    pub root: PathBuf,
    pub cfg: Arc<ConfigFile>,
    pub mode: Mode,
}

impl BuildContext {
    pub fn new(root: impl Into<PathBuf>, cfg: Arc<ConfigFile>, mode: Mode) -> Self {
        Self {
            root: root.into(),
            cfg,
            mode,
        }
    }

    pub fn source_root(&self) -> PathBuf {
        self.root.join(&self.cfg.paths.source)
    }

    /// Output root for staged artifacts: temporary during development,
    /// final in production builds.
    pub fn staged_out(&self) -> PathBuf {
        self.root.join(self.cfg.paths.out_root(self.mode, false))
    }

    /// Output root for final artifacts, regardless of mode.
    pub fn final_out(&self) -> PathBuf {
        self.root.join(self.cfg.paths.out_root(self.mode, true))
    }

    pub fn dev_out(&self) -> PathBuf {
        self.root.join(&self.cfg.paths.dev_out)
    }

    pub fn prod_out(&self) -> PathBuf {
        self.root.join(&self.cfg.paths.prod_out)
    }
}

/// Build the default task graph over the standard pipelines.
///
/// Every producer declares `clean` as a prerequisite, so the output tree
/// is wiped exactly once before anything writes into it; incremental
/// rebuilds see `clean`'s recorded success and skip it. `build` is the
/// aggregate the CLI and the watch session's initial run trigger.
///
/// The `production` flag on a task mirrors which output root its pipeline
/// targets: final-artifact tasks (images, fonts, copy) always write to
/// the production root, the staged ones follow the build mode.
pub fn default_registry(ctx: Arc<BuildContext>) -> Result<TaskRegistry> {
    let mut registry = TaskRegistry::new();

    let c = Arc::clone(&ctx);
    registry.register(task("clean", Deps::none(), false, move || clean::run(&c)))?;

    let c = Arc::clone(&ctx);
    registry.register(task("styles", Deps::parallel(["clean"]), false, move || {
        styles::run(&c)
    }))?;

    let c = Arc::clone(&ctx);
    registry.register(task("scripts", Deps::parallel(["clean"]), false, move || {
        scripts::run(&c)
    }))?;

    let c = Arc::clone(&ctx);
    registry.register(task("images", Deps::parallel(["clean"]), true, move || {
        images::run(&c)
    }))?;

    let c = Arc::clone(&ctx);
    registry.register(task("fonts", Deps::parallel(["clean"]), true, move || {
        fonts::run(&c)
    }))?;

    let c = Arc::clone(&ctx);
    registry.register(task("pages", Deps::sequential(["clean"]), false, move || {
        pages::run(&c)
    }))?;

    let c = Arc::clone(&ctx);
    registry.register(task("copy", Deps::parallel(["clean"]), true, move || {
        copy::run(&c)
    }))?;

    registry.register(task(
        "build",
        Deps::parallel(["styles", "scripts", "images", "fonts", "pages", "copy"]),
        false,
        || Ok(()),
    ))?;

    Ok(registry)
}
