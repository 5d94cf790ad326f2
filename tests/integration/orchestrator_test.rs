// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{build_fetcher, lenient_config, Reply, ScriptedEngine, BOOKS_HTML};
use chrono::{Duration as ChronoDuration, Utc};
use pricewatch::crawler::fetcher::FetcherConfig;
use pricewatch::crawler::orchestrator::RunOrchestrator;
use pricewatch::domain::models::observation::Source;
use pricewatch::domain::repositories::observation_store::ObservationStore;
use pricewatch::domain::services::extraction::TemplateExtractor;
use pricewatch::infrastructure::memory_store::MemoryObservationStore;
use std::sync::Arc;
use tokio::sync::watch;

fn source(name: &str, url: &str) -> Source {
    Source {
        name: name.to_string(),
        url: url.to_string(),
        wait_selector: None,
    }
}

/// Long enough to pass the content-length check, but with no listings.
fn long_bare_page() -> String {
    format!("<html><body><div id=\"app\">{}</div></body></html>", "x".repeat(2000))
}

#[tokio::test]
async fn test_empty_extraction_triggers_rendered_reattempt() {
    let static_engine = ScriptedEngine::always("static", 200, &long_bare_page());
    let browser_engine = ScriptedEngine::always("browser", 200, BOOKS_HTML);
    let fetcher = Arc::new(build_fetcher(
        static_engine.clone(),
        browser_engine.clone(),
        FetcherConfig::default(),
    ));
    let store = Arc::new(MemoryObservationStore::new());
    let orchestrator = RunOrchestrator::new(fetcher, Arc::new(TemplateExtractor::new()), store.clone());

    let sources = vec![source("Shop B", "https://shop-b.example/catalogue")];
    let total = orchestrator.run_once(&sources).await.unwrap();

    assert_eq!(total, 2);
    assert_eq!(store.len(), 2);
    // The re-attempt carries a generic listing hint for the renderer.
    let selectors = browser_engine.selectors();
    assert_eq!(selectors.len(), 1);
    assert!(selectors[0].as_deref().unwrap().contains("product_pod"));

    // Records from one source in one run share a timestamp.
    let since = Utc::now() - ChronoDuration::days(1);
    let history = store.load_history(since).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].observed_at, history[1].observed_at);
}

#[tokio::test]
async fn test_source_failure_does_not_abort_the_run() {
    // First source: static 500 and the rendered fallback times out.
    // Second source: clean static page.
    let static_engine = ScriptedEngine::new(
        "static",
        vec![Reply::page(500, "")],
        Reply::page(200, BOOKS_HTML),
    );
    let browser_engine = ScriptedEngine::new("browser", Vec::new(), Reply::Timeout);
    let fetcher = Arc::new(build_fetcher(
        static_engine,
        browser_engine,
        lenient_config(),
    ));
    let store = Arc::new(MemoryObservationStore::new());
    let orchestrator = RunOrchestrator::new(fetcher, Arc::new(TemplateExtractor::new()), store.clone());

    let sources = vec![
        source("Broken Shop", "https://broken.example/products"),
        source("Shop B", "https://shop-b.example/catalogue"),
    ];
    let total = orchestrator.run_once(&sources).await.unwrap();

    assert_eq!(total, 2);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_nothing_extracted_anywhere_is_not_an_error() {
    let static_engine = ScriptedEngine::always("static", 200, &long_bare_page());
    let browser_engine = ScriptedEngine::always("browser", 200, &long_bare_page());
    let fetcher = Arc::new(build_fetcher(
        static_engine,
        browser_engine,
        FetcherConfig::default(),
    ));
    let store = Arc::new(MemoryObservationStore::new());
    let orchestrator = RunOrchestrator::new(fetcher, Arc::new(TemplateExtractor::new()), store.clone());

    let sources = vec![source("Shop A", "https://shop-a.example/products")];
    let total = orchestrator.run_once(&sources).await.unwrap();

    assert_eq!(total, 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_cancellation_respected_at_source_boundary() {
    let static_engine = ScriptedEngine::always("static", 200, BOOKS_HTML);
    let browser_engine = ScriptedEngine::always("browser", 200, BOOKS_HTML);
    let fetcher = Arc::new(build_fetcher(
        static_engine.clone(),
        browser_engine,
        lenient_config(),
    ));
    let store = Arc::new(MemoryObservationStore::new());
    let orchestrator = RunOrchestrator::new(fetcher, Arc::new(TemplateExtractor::new()), store.clone());

    let (tx, rx) = watch::channel(true);
    let sources = vec![
        source("Shop A", "https://shop-a.example/products"),
        source("Shop B", "https://shop-b.example/catalogue"),
    ];
    let total = orchestrator
        .run_once_cancellable(&sources, Some(&rx))
        .await
        .unwrap();
    drop(tx);

    assert_eq!(total, 0);
    assert_eq!(static_engine.calls(), 0);
    assert!(store.is_empty());
}
