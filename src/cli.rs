// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `sitebuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitebuild",
    version,
    about = "Build a static-site source tree, watch it, and live-reload browsers.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Sitebuild.toml` in the current working directory. A missing
    /// file is not an error; built-in defaults are used instead.
    #[arg(long, value_name = "PATH", default_value = "Sitebuild.toml")]
    pub config: String,

    /// Build for production (minified output, final output directory).
    ///
    /// Also settable via `SITEBUILD_ENV=production`.
    #[arg(long, global = true)]
    pub production: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the full build once and exit (non-zero on first task failure).
    Build,

    /// Build, then watch the source tree and serve it with live reload.
    Watch,

    /// Remove all build output.
    Clean,

    /// Scaffold a new source file from a template.
    New {
        #[command(subcommand)]
        kind: NewKind,
    },
}

/// What `sitebuild new` should generate.
#[derive(Debug, Clone, Subcommand)]
pub enum NewKind {
    /// A page under the pages directory (name is dash-cased).
    Page { name: String },
    /// A stylesheet partial under the components directory.
    Component { name: String },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
