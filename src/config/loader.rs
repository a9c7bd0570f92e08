// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `ConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_config`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load the configuration for the rest of the application.
///
/// - A missing config file is not an error: the starter kit works out of the
///   box with built-in defaults.
/// - A present but malformed or invalid file is fatal.
pub fn load_config(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();

    let config = if path.is_file() {
        load_from_path(path)?
    } else {
        debug!(?path, "no config file found; using built-in defaults");
        ConfigFile::default()
    };

    validate_config(&config)?;
    Ok(config)
}
