use std::error::Error;
use std::time::Duration;

use sitebuild::engine::{spawn_debouncer, BindingHit, RuntimeEvent};
use tokio::sync::mpsc;

type TestResult = Result<(), Box<dyn Error>>;

fn hit(task: &str, full: bool, path: &str) -> BindingHit {
    BindingHit {
        task: task.to_string(),
        full_reload: full,
        path: path.to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn a_burst_of_events_settles_into_one_batch() -> TestResult {
    let (hits_tx, hits_rx) = mpsc::channel(16);
    let (rt_tx, mut rt_rx) = mpsc::channel(16);

    spawn_debouncer(Duration::from_millis(50), hits_rx, rt_tx);

    // An editor save typically fires several events back to back.
    hits_tx.send(hit("styles", false, "styles/main.css")).await?;
    hits_tx.send(hit("styles", false, "styles/main.css")).await?;
    hits_tx.send(hit("pages", true, "pages/index.html")).await?;

    let Some(RuntimeEvent::BatchTriggered { batch }) = rt_rx.recv().await else {
        panic!("expected a trigger batch");
    };

    assert_eq!(batch.tasks(), &["styles".to_string(), "pages".to_string()]);
    assert_eq!(batch.reload(), Some(true), "page change upgrades to a full reload");

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn separate_bursts_become_separate_batches() -> TestResult {
    let (hits_tx, hits_rx) = mpsc::channel(16);
    let (rt_tx, mut rt_rx) = mpsc::channel(16);

    spawn_debouncer(Duration::from_millis(50), hits_rx, rt_tx);

    hits_tx.send(hit("styles", false, "styles/a.css")).await?;
    let Some(RuntimeEvent::BatchTriggered { batch }) = rt_rx.recv().await else {
        panic!("expected first batch");
    };
    assert_eq!(batch.tasks(), &["styles".to_string()]);
    assert_eq!(batch.reload(), Some(false));

    hits_tx.send(hit("scripts", true, "scripts/app.js")).await?;
    let Some(RuntimeEvent::BatchTriggered { batch }) = rt_rx.recv().await else {
        panic!("expected second batch");
    };
    assert_eq!(batch.tasks(), &["scripts".to_string()]);
    assert_eq!(batch.reload(), Some(true));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn pending_events_flush_when_the_watcher_goes_away() -> TestResult {
    let (hits_tx, hits_rx) = mpsc::channel(16);
    let (rt_tx, mut rt_rx) = mpsc::channel(16);

    let handle = spawn_debouncer(Duration::from_millis(50), hits_rx, rt_tx);

    hits_tx.send(hit("styles", false, "styles/a.css")).await?;
    drop(hits_tx);

    let Some(RuntimeEvent::BatchTriggered { batch }) = rt_rx.recv().await else {
        panic!("expected flush on close");
    };
    assert_eq!(batch.tasks(), &["styles".to_string()]);

    handle.await?;
    Ok(())
}
