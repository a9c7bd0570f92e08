// src/errors.rs

//! Crate-wide error type.
//!
//! Registry and watch-setup errors are fatal and reported before any unit of
//! work starts; `TaskExecution` wraps whatever a unit of work reported.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("task '{task}' failed: {source}")]
    TaskExecution {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("watch setup error: {0}")]
    WatchSetup(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BuildError>;
