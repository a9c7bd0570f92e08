// src/config/validate.rs

use globset::Glob;

use crate::config::model::ConfigFile;
use crate::errors::{BuildError, Result};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - all watch/exclude patterns are valid globs (reported as `WatchSetup`,
///   before any watcher or task starts)
/// - the dev and prod output roots are distinct from the source root
/// - `serve` ports are non-zero and distinct
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_patterns(cfg)?;
    validate_paths(cfg)?;
    validate_serve(cfg)?;
    Ok(())
}

fn validate_patterns(cfg: &ConfigFile) -> Result<()> {
    let groups: [(&str, &[String]); 7] = [
        ("styles.watch", &cfg.styles.watch),
        ("scripts.watch", &cfg.scripts.watch),
        ("images.watch", &cfg.images.watch),
        ("fonts.watch", &cfg.fonts.watch),
        ("pages.watch", &cfg.pages.watch),
        ("copy.watch", &cfg.copy.watch),
        ("copy.exclude", &cfg.copy.exclude),
    ];

    for (section, patterns) in groups {
        for pat in patterns {
            Glob::new(pat).map_err(|e| {
                BuildError::WatchSetup(format!("invalid glob in [{section}]: {pat}: {e}"))
            })?;
        }
    }

    Ok(())
}

fn validate_paths(cfg: &ConfigFile) -> Result<()> {
    let p = &cfg.paths;
    if p.dev_out == p.source || p.prod_out == p.source {
        return Err(BuildError::Config(format!(
            "output roots must differ from the source root (source = {:?})",
            p.source
        )));
    }
    Ok(())
}

fn validate_serve(cfg: &ConfigFile) -> Result<()> {
    if cfg.serve.port == 0 || cfg.serve.ws_port == 0 {
        return Err(BuildError::Config(
            "[serve] ports must be non-zero".to_string(),
        ));
    }
    if cfg.serve.port == cfg.serve.ws_port {
        return Err(BuildError::Config(format!(
            "[serve] port and ws_port must differ (both {})",
            cfg.serve.port
        )));
    }
    Ok(())
}
