// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod reload;
pub mod scaffold;
pub mod serve;
pub mod tasks;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::info;

use crate::cli::{CliArgs, Command, NewKind};
use crate::config::{ConfigFile, Mode};
use crate::engine::{
    run_invocation, spawn_debouncer, BindingHit, Invocation, Runtime, RuntimeEvent,
    RuntimeOptions,
};
use crate::errors::Result;
use crate::pipeline::BuildContext;
use crate::tasks::Scheduler;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the default task registry over the output pipelines
/// - one-shot runs (`build`, `clean`) or the full watch session
/// - the scaffolding generators
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = Arc::new(config::load_config(&config_path)?);
    let mode = Mode::resolve(args.production);
    let root = project_root(&config_path);
    let ctx = Arc::new(BuildContext::new(root, Arc::clone(&cfg), mode));

    match args.command {
        Command::Build => {
            let registry = pipeline::default_registry(Arc::clone(&ctx))?;
            run_invocation(&registry, Invocation::Task("build".to_string())).await
        }
        Command::Clean => {
            let registry = pipeline::default_registry(Arc::clone(&ctx))?;
            run_invocation(&registry, Invocation::Task("clean".to_string())).await
        }
        Command::Watch => run_watch(ctx, cfg, mode).await,
        Command::New { kind } => {
            match kind {
                NewKind::Page { name } => scaffold::create_page(&ctx, &name)?,
                NewKind::Component { name } => scaffold::create_component(&ctx, &name)?,
            };
            Ok(())
        }
    }
}

/// The watch session: initial build, file watcher, debouncer, dev server,
/// and live reload, all running until Ctrl-C.
async fn run_watch(ctx: Arc<BuildContext>, cfg: Arc<ConfigFile>, mode: Mode) -> Result<()> {
    let registry = pipeline::default_registry(Arc::clone(&ctx))?;
    let mut scheduler = Scheduler::from_registry(&registry)?;

    // Live reload + dev server.
    let reload_server = reload::start_reload_server(cfg.serve.ws_port)?;
    let roots = vec![ctx.staged_out(), ctx.source_root(), ctx.final_out()];
    let http = serve::spawn_http_server(cfg.serve.port, roots, reload_server.port())?;

    // Watcher feeding the debouncer feeding the runtime.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let (hits_tx, hits_rx) = mpsc::channel::<BindingHit>(256);

    let specs = watch::default_binding_specs(&cfg, mode);
    let bindings = watch::build_bindings(&specs)?;
    let _watcher = watch::spawn_watcher(ctx.source_root(), bindings, hits_tx)?;
    let _debouncer = spawn_debouncer(
        Duration::from_millis(cfg.watch.debounce_ms),
        hits_rx,
        rt_tx.clone(),
    );

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let exec_tx = exec::spawn_executor(rt_tx.clone());

    info!(
        http_port = http.port(),
        ws_port = reload_server.port(),
        "watch session started"
    );

    let runtime = Runtime::new(
        &mut scheduler,
        RuntimeOptions {
            exit_when_idle: false,
            keep_going: true,
        },
        rt_rx,
        exec_tx,
    )
    .with_stages(vec![engine::TriggerBatch::manual(vec!["build"])])
    .with_reload_sink(reload_server.hub());

    runtime.run().await
}

/// Figure out a sensible project root: the directory containing the
/// config file, or `.`.
fn project_root(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
