use std::error::Error;
use std::fs;
use std::path::PathBuf;

use sitebuild::config::{load_config, ConfigFile, Mode, StyleReload};
use sitebuild::errors::BuildError;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn missing_config_file_falls_back_to_defaults() -> TestResult {
    let dir = tempfile::tempdir()?;
    let cfg = load_config(dir.path().join("Sitebuild.toml"))?;

    assert_eq!(cfg.paths.source, PathBuf::from("app"));
    assert_eq!(cfg.paths.dev_out, PathBuf::from(".tmp"));
    assert_eq!(cfg.paths.prod_out, PathBuf::from("dist"));
    assert_eq!(cfg.watch.debounce_ms, 50);
    assert_eq!(cfg.watch.production_style_reload, StyleReload::Inject);
    assert_eq!(cfg.serve.port, 9000);
    assert_eq!(cfg.serve.ws_port, 35729);
    assert_eq!(cfg.styles.watch, vec!["styles/**/*.css".to_string()]);

    Ok(())
}

#[test]
fn config_file_overrides_defaults() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Sitebuild.toml");
    fs::write(
        &path,
        r#"
[paths]
source = "site"
dev_out = "out-dev"
prod_out = "out"

[watch]
debounce_ms = 200
production_style_reload = "full"

[serve]
port = 8080

[scripts]
bundle = "bundle.js"
"#,
    )?;

    let cfg = load_config(&path)?;

    assert_eq!(cfg.paths.source, PathBuf::from("site"));
    assert_eq!(cfg.watch.debounce_ms, 200);
    assert_eq!(cfg.watch.production_style_reload, StyleReload::Full);
    assert_eq!(cfg.serve.port, 8080);
    assert_eq!(cfg.serve.ws_port, 35729, "unset fields keep their defaults");
    assert_eq!(cfg.scripts.bundle, "bundle.js");

    Ok(())
}

#[test]
fn malformed_toml_is_fatal() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Sitebuild.toml");
    fs::write(&path, "[paths\nsource = ")?;

    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, BuildError::Toml(_)));
    Ok(())
}

#[test]
fn invalid_glob_fails_watch_setup_up_front() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Sitebuild.toml");
    fs::write(
        &path,
        r#"
[styles]
watch = ["styles/["]
"#,
    )?;

    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, BuildError::WatchSetup(_)));
    Ok(())
}

#[test]
fn output_root_colliding_with_source_is_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Sitebuild.toml");
    fs::write(
        &path,
        r#"
[paths]
source = "app"
dev_out = "app"
"#,
    )?;

    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, BuildError::Config(_)));
    Ok(())
}

#[test]
fn colliding_serve_ports_are_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Sitebuild.toml");
    fs::write(
        &path,
        r#"
[serve]
port = 9000
ws_port = 9000
"#,
    )?;

    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, BuildError::Config(_)));
    Ok(())
}

#[test]
fn output_roots_follow_mode_and_artifact_flag() {
    let cfg = ConfigFile::default();

    // Staged tasks follow the mode; final-artifact tasks always target
    // the production root.
    assert_eq!(
        cfg.paths.out_root(Mode::Development, false),
        PathBuf::from(".tmp").as_path()
    );
    assert_eq!(
        cfg.paths.out_root(Mode::Production, false),
        PathBuf::from("dist").as_path()
    );
    assert_eq!(
        cfg.paths.out_root(Mode::Development, true),
        PathBuf::from("dist").as_path()
    );
}
