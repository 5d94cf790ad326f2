// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    build_fetcher, build_fetcher_with_limiter, lenient_config, Reply, ScriptedEngine, BARE_HTML,
    BOOKS_HTML,
};
use pricewatch::crawler::fetcher::{FetchError, Fetcher, FetcherConfig};
use pricewatch::crawler::rate_limiter::{DomainRateLimiter, RateLimiterConfig};
use pricewatch::crawler::robots::RobotsGate;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_sufficient_static_content_skips_rendered() {
    let static_engine = ScriptedEngine::always("static", 200, BOOKS_HTML);
    let browser_engine = ScriptedEngine::always("browser", 200, BOOKS_HTML);
    let fetcher = build_fetcher(
        static_engine.clone(),
        browser_engine.clone(),
        lenient_config(),
    );

    let page = fetcher
        .fetch_with_fallback("https://shop-a.example/products", None)
        .await
        .unwrap();

    assert!(page.html.contains("Tipping the Velvet"));
    assert_eq!(static_engine.calls(), 1);
    assert_eq!(browser_engine.calls(), 0);
}

#[tokio::test]
async fn test_short_static_content_escalates_to_rendered() {
    // Default threshold is 1024 bytes; the bare shell is well under it.
    let static_engine = ScriptedEngine::always("static", 200, BARE_HTML);
    let browser_engine = ScriptedEngine::always("browser", 200, BOOKS_HTML);
    let fetcher = build_fetcher(
        static_engine.clone(),
        browser_engine.clone(),
        FetcherConfig::default(),
    );

    let page = fetcher
        .fetch_with_fallback("https://shop-a.example/products", Some("article.product_pod"))
        .await
        .unwrap();

    assert!(page.html.contains("product_pod"));
    assert_eq!(static_engine.calls(), 1);
    assert_eq!(browser_engine.calls(), 1);
    assert_eq!(
        browser_engine.selectors(),
        vec![Some("article.product_pod".to_string())]
    );
}

#[tokio::test]
async fn test_static_error_escalates_to_rendered() {
    let static_engine = ScriptedEngine::always("static", 500, "");
    let browser_engine = ScriptedEngine::always("browser", 200, BOOKS_HTML);
    let fetcher = build_fetcher(
        static_engine.clone(),
        browser_engine.clone(),
        lenient_config(),
    );

    let page = fetcher
        .fetch_with_fallback("https://shop-a.example/products", None)
        .await
        .unwrap();

    assert!(page.html.contains("A Light in the Attic"));
    assert_eq!(static_engine.calls(), 1);
    assert_eq!(browser_engine.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_retry_then_success() {
    let limiter = Arc::new(DomainRateLimiter::new(RateLimiterConfig {
        min_delay_secs: 2.0,
        max_delay_secs: 4.0,
        requests_per_minute: 100,
        backoff_factor: 2.0,
    }));
    let static_engine = ScriptedEngine::new(
        "static",
        vec![Reply::page(429, "")],
        Reply::page(200, BOOKS_HTML),
    );
    let browser_engine = ScriptedEngine::always("browser", 200, "");
    let fetcher = build_fetcher_with_limiter(
        limiter.clone(),
        static_engine.clone(),
        browser_engine,
        lenient_config(),
    );

    let url = "https://shop-a.example/products";
    let page = fetcher.fetch(url).await.unwrap();

    assert!(page.html.contains("A Light in the Attic"));
    assert_eq!(static_engine.calls(), 2);
    // One 429 widened the delay range once, and it stays widened.
    assert_eq!(limiter.current_delay_range(url), (4.0, 8.0));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_budget_exhausted() {
    let limiter = Arc::new(DomainRateLimiter::new(RateLimiterConfig {
        min_delay_secs: 2.0,
        max_delay_secs: 4.0,
        requests_per_minute: 100,
        backoff_factor: 2.0,
    }));
    let static_engine = ScriptedEngine::always("static", 429, "");
    let browser_engine = ScriptedEngine::always("browser", 200, "");
    let fetcher = build_fetcher_with_limiter(
        limiter.clone(),
        static_engine.clone(),
        browser_engine,
        lenient_config(),
    );

    let url = "https://shop-a.example/products";
    let result = fetcher.fetch(url).await;

    assert_eq!(result.unwrap_err(), FetchError::RateLimited);
    // Default budget allows one retry: two attempts, two widenings.
    assert_eq!(static_engine.calls(), 2);
    assert_eq!(limiter.current_delay_range(url), (8.0, 16.0));
}

#[tokio::test]
async fn test_robots_denied_skips_network_and_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&server)
        .await;

    let static_engine = ScriptedEngine::always("static", 200, BOOKS_HTML);
    let browser_engine = ScriptedEngine::always("browser", 200, BOOKS_HTML);
    let gate = Arc::new(RobotsGate::new(true, Duration::from_secs(2)));
    let limiter = Arc::new(DomainRateLimiter::new(RateLimiterConfig {
        min_delay_secs: 0.0,
        max_delay_secs: 0.0,
        requests_per_minute: 1000,
        backoff_factor: 2.0,
    }));
    let fetcher = Fetcher::new(
        gate,
        limiter,
        static_engine.clone(),
        browser_engine.clone(),
        lenient_config(),
    );

    let url = format!("{}/products", server.uri());
    let result = fetcher.fetch_with_fallback(&url, None).await;

    assert_eq!(result.unwrap_err(), FetchError::RobotsDenied);
    // The verdict is deterministic within a run: no engine call, no escalation.
    assert_eq!(static_engine.calls(), 0);
    assert_eq!(browser_engine.calls(), 0);
}

#[tokio::test]
async fn test_rendered_timeout_reported_as_such() {
    let static_engine = ScriptedEngine::always("static", 200, BOOKS_HTML);
    let browser_engine = ScriptedEngine::new("browser", Vec::new(), Reply::Timeout);
    let fetcher = build_fetcher(static_engine, browser_engine, lenient_config());

    let result = fetcher
        .fetch_rendered("https://shop-a.example/products", Some("li.product"))
        .await;

    assert_eq!(result.unwrap_err(), FetchError::RenderTimeout);
}
