// src/config/mod.rs

//! Configuration loading and validation for sitebuild.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, falling back to defaults (`loader.rs`).
//! - Validate basic invariants like glob syntax and ports (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_config, load_from_path};
pub use model::{
    ConfigFile, CopySection, FontsSection, ImagesSection, Mode, PagesSection, PathsSection,
    ScriptsSection, ServeSection, StyleReload, StylesSection, WatchSection,
};
pub use validate::validate_config;
