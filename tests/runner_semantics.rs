use std::error::Error;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sitebuild::engine::{run_invocation, Invocation};
use sitebuild::errors::BuildError;
use sitebuild::tasks::{task, Deps, TaskRegistry};

type TestResult = Result<(), Box<dyn Error>>;

/// Shared event log: every unit of work pushes `<name>:start` and
/// `<name>:end` markers.
#[derive(Clone, Default)]
struct Timeline(Arc<Mutex<Vec<String>>>);

impl Timeline {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn index_of(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    fn count_of(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }
}

fn recording(name: &'static str, deps: Deps, timeline: Timeline) -> sitebuild::tasks::TaskSpec {
    task(name, deps, false, move || {
        timeline.push(format!("{name}:start"));
        std::thread::sleep(Duration::from_millis(20));
        timeline.push(format!("{name}:end"));
        Ok(())
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn run_invokes_the_unit_of_work_exactly_once_per_call() -> TestResult {
    let count = Arc::new(AtomicUsize::new(0));

    let mut registry = TaskRegistry::new();
    let c = Arc::clone(&count);
    registry.register(task("styles", Deps::none(), false, move || {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }))?;

    run_invocation(&registry, Invocation::Task("styles".into())).await?;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    run_invocation(&registry, Invocation::Task("styles".into())).await?;
    assert_eq!(count.load(Ordering::SeqCst), 2);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sequential_prerequisites_complete_in_listed_order() -> TestResult {
    let timeline = Timeline::default();

    let mut registry = TaskRegistry::new();
    registry.register(recording("first", Deps::none(), timeline.clone()))?;
    registry.register(recording("second", Deps::none(), timeline.clone()))?;
    registry.register(recording(
        "deploy",
        Deps::sequential(["first", "second"]),
        timeline.clone(),
    ))?;

    run_invocation(&registry, Invocation::Task("deploy".into())).await?;

    let first_end = timeline.index_of("first:end").unwrap();
    let second_start = timeline.index_of("second:start").unwrap();
    let second_end = timeline.index_of("second:end").unwrap();
    let deploy_start = timeline.index_of("deploy:start").unwrap();

    assert!(first_end < second_start, "first must finish before second starts");
    assert!(second_end < deploy_start, "prerequisites finish before the task runs");

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_prerequisites_overlap() -> TestResult {
    // Each member waits for its sibling to start before finishing. If the
    // runner serialized them this would fail instead of deadlocking.
    fn wait_for(flag: &AtomicBool) -> anyhow::Result<()> {
        for _ in 0..200 {
            if flag.load(Ordering::SeqCst) {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        anyhow::bail!("sibling never started; group was not concurrent")
    }

    let left_started = Arc::new(AtomicBool::new(false));
    let right_started = Arc::new(AtomicBool::new(false));

    let mut registry = TaskRegistry::new();
    {
        let mine = Arc::clone(&left_started);
        let sibling = Arc::clone(&right_started);
        registry.register(task("left", Deps::none(), false, move || {
            mine.store(true, Ordering::SeqCst);
            wait_for(&sibling)
        }))?;
    }
    {
        let mine = Arc::clone(&right_started);
        let sibling = Arc::clone(&left_started);
        registry.register(task("right", Deps::none(), false, move || {
            mine.store(true, Ordering::SeqCst);
            wait_for(&sibling)
        }))?;
    }
    registry.register(task(
        "both",
        Deps::parallel(["left", "right"]),
        false,
        || Ok(()),
    ))?;

    run_invocation(&registry, Invocation::Task("both".into())).await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sequential_chain_failure_stops_everything_downstream() -> TestResult {
    let timeline = Timeline::default();

    let mut registry = TaskRegistry::new();
    {
        let t = timeline.clone();
        registry.register(task("broken", Deps::none(), false, move || {
            t.push("broken:start");
            anyhow::bail!("stylesheet is malformed")
        }))?;
    }
    registry.register(recording("later", Deps::none(), timeline.clone()))?;
    registry.register(recording(
        "site",
        Deps::sequential(["broken", "later"]),
        timeline.clone(),
    ))?;

    let err = run_invocation(&registry, Invocation::Task("site".into()))
        .await
        .unwrap_err();

    match err {
        BuildError::TaskExecution { task, source } => {
            assert_eq!(task, "broken");
            assert!(format!("{source:#}").contains("malformed"));
        }
        other => panic!("expected TaskExecution, got {other:?}"),
    }

    assert_eq!(timeline.count_of("later:start"), 0, "later must never start");
    assert_eq!(timeline.count_of("site:start"), 0, "dependent must never start");

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unknown_task_fails_before_any_work_starts() -> TestResult {
    let count = Arc::new(AtomicUsize::new(0));

    let mut registry = TaskRegistry::new();
    let c = Arc::clone(&count);
    registry.register(task("known", Deps::none(), false, move || {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }))?;

    let err = run_invocation(&registry, Invocation::Task("missing".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::UnknownTask(name) if name == "missing"));

    // Even when the unknown name comes second in a sequence, nothing runs.
    let err = run_invocation(
        &registry,
        Invocation::Sequence(vec!["known".into(), "missing".into()]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BuildError::UnknownTask(_)));
    assert_eq!(count.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_prerequisite_in_a_diamond_runs_once() -> TestResult {
    let count = Arc::new(AtomicUsize::new(0));

    let mut registry = TaskRegistry::new();
    let c = Arc::clone(&count);
    registry.register(task("base", Deps::none(), false, move || {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }))?;
    registry.register(task("left", Deps::parallel(["base"]), false, || Ok(())))?;
    registry.register(task("right", Deps::parallel(["base"]), false, || Ok(())))?;
    registry.register(task(
        "top",
        Deps::parallel(["left", "right"]),
        false,
        || Ok(()),
    ))?;

    run_invocation(&registry, Invocation::Task("top".into())).await?;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn group_invocation_runs_every_member() -> TestResult {
    let count = Arc::new(AtomicUsize::new(0));

    let mut registry = TaskRegistry::new();
    for name in ["styles", "scripts", "pages"] {
        let c = Arc::clone(&count);
        registry.register(task(name, Deps::none(), false, move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))?;
    }

    run_invocation(
        &registry,
        Invocation::Group(vec!["styles".into(), "scripts".into(), "pages".into()]),
    )
    .await?;

    assert_eq!(count.load(Ordering::SeqCst), 3);
    Ok(())
}
