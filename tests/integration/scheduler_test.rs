// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{build_fetcher, lenient_config, ScriptedEngine, BOOKS_HTML};
use anyhow::bail;
use async_trait::async_trait;
use pricewatch::crawler::orchestrator::RunOrchestrator;
use pricewatch::crawler::scheduler::Scheduler;
use pricewatch::domain::models::observation::Source;
use pricewatch::domain::services::extraction::TemplateExtractor;
use pricewatch::domain::services::notification::Notifier;
use pricewatch::infrastructure::memory_store::MemoryObservationStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

struct FailingNotifier {
    calls: AtomicUsize,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _subject: &str, _body: &str) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        bail!("webhook endpoint is down")
    }
}

fn test_sources() -> Vec<Source> {
    vec![Source {
        name: "Shop A".to_string(),
        url: "https://shop-a.example/products".to_string(),
        wait_selector: None,
    }]
}

fn build_scheduler(
    static_engine: Arc<ScriptedEngine>,
    interval: Duration,
    notifier: Option<Arc<dyn Notifier>>,
) -> (Scheduler, Arc<MemoryObservationStore>) {
    let browser_engine = ScriptedEngine::always("browser", 200, BOOKS_HTML);
    let fetcher = Arc::new(build_fetcher(
        static_engine,
        browser_engine,
        lenient_config(),
    ));
    let store = Arc::new(MemoryObservationStore::new());
    let orchestrator = Arc::new(RunOrchestrator::new(
        fetcher,
        Arc::new(TemplateExtractor::new()),
        store.clone(),
    ));
    (
        Scheduler::new(orchestrator, test_sources(), interval, notifier),
        store,
    )
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_first_run_prevents_second() {
    let static_engine = ScriptedEngine::always("static", 200, BOOKS_HTML);
    let (scheduler, store) = build_scheduler(static_engine.clone(), Duration::from_secs(60), None);

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move { scheduler.run(rx).await });

    // The first pass finishes well before the 60s interval elapses.
    sleep(Duration::from_secs(1)).await;
    assert_eq!(static_engine.calls(), 1);
    assert_eq!(store.len(), 2);

    tx.send(true).unwrap();
    handle.await.unwrap().unwrap();

    // Cancellation interrupted the sleep; no second run happened.
    assert_eq!(static_engine.calls(), 1);
    assert_eq!(store.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_start_runs_nothing() {
    let static_engine = ScriptedEngine::always("static", 200, BOOKS_HTML);
    let (scheduler, store) = build_scheduler(static_engine.clone(), Duration::from_secs(60), None);

    let (tx, rx) = watch::channel(true);
    scheduler.run(rx).await.unwrap();
    drop(tx);

    assert_eq!(static_engine.calls(), 0);
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_notifier_failure_does_not_stop_the_loop() {
    let static_engine = ScriptedEngine::always("static", 200, BOOKS_HTML);
    let notifier = Arc::new(FailingNotifier {
        calls: AtomicUsize::new(0),
    });
    let (scheduler, store) = build_scheduler(
        static_engine.clone(),
        Duration::from_secs(60),
        Some(notifier.clone()),
    );

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move { scheduler.run(rx).await });

    // Let the interval elapse once so a second run happens.
    sleep(Duration::from_secs(61)).await;
    tx.send(true).unwrap();
    handle.await.unwrap().unwrap();

    assert!(static_engine.calls() >= 2);
    assert!(notifier.calls.load(Ordering::SeqCst) >= 2);
    assert!(store.len() >= 4);
}
