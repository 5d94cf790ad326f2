// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{bail, Context, Result};
use pricewatch::analysis::changes::ChangeThresholds;
use pricewatch::analysis::report::{self, ReportConfig};
use pricewatch::config::settings::Settings;
use pricewatch::crawler::fetcher::{Fetcher, FetcherConfig};
use pricewatch::crawler::orchestrator::RunOrchestrator;
use pricewatch::crawler::rate_limiter::{DomainRateLimiter, RateLimiterConfig};
use pricewatch::crawler::robots::RobotsGate;
use pricewatch::crawler::scheduler::Scheduler;
use pricewatch::domain::models::observation::Source;
use pricewatch::domain::services::extraction::TemplateExtractor;
use pricewatch::domain::services::notification::Notifier;
use pricewatch::engines::browser_engine::BrowserEngine;
use pricewatch::engines::static_engine::StaticEngine;
use pricewatch::infrastructure::sqlite_store::SqliteObservationStore;
use pricewatch::infrastructure::webhook_notifier::WebhookNotifier;
use pricewatch::utils::telemetry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// 主函数
///
/// 应用程序入口点。模式：`once` 单轮抓取，`watch` 周期抓取，
/// `report` 对已有历史做一次分析
#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_telemetry();

    let settings = Settings::new().context("failed to load configuration")?;
    info!("configuration loaded");

    let mode = std::env::args().nth(1).unwrap_or_else(|| "once".to_string());

    let store = Arc::new(
        SqliteObservationStore::connect(&settings.storage.database_path)
            .await
            .context("failed to open observation store")?,
    );

    match mode.as_str() {
        "once" => {
            let orchestrator = build_orchestrator(&settings, store.clone());
            let count = orchestrator.run_once(&sources_from(&settings)).await?;
            info!(count, "run finished");
        }
        "watch" => {
            let orchestrator = build_orchestrator(&settings, store.clone());
            let scheduler = Scheduler::new(
                orchestrator,
                sources_from(&settings),
                Duration::from_secs(settings.crawler.interval_minutes * 60),
                build_notifier(&settings),
            );

            let (stop_tx, stop_rx) = watch::channel(false);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => info!("shutdown signal received"),
                    Err(e) => tracing::error!("unable to listen for shutdown signal: {}", e),
                }
                let _ = stop_tx.send(true);
            });

            scheduler.run(stop_rx).await?;
        }
        "report" => {
            let config = ReportConfig {
                window_days: settings.analysis.window_days,
                thresholds: ChangeThresholds {
                    min_abs: settings.analysis.min_abs_change,
                    min_percent: settings.analysis.min_percent_change,
                },
            };
            let result = report::generate_report(store.as_ref(), config).await?;
            println!("{}", report::render(&result));
        }
        other => bail!("unknown mode '{}', expected once|watch|report", other),
    }

    Ok(())
}

fn sources_from(settings: &Settings) -> Vec<Source> {
    if settings.sources.is_empty() {
        Settings::default_sources()
    } else {
        settings.sources.clone()
    }
}

fn build_orchestrator(settings: &Settings, store: Arc<SqliteObservationStore>) -> Arc<RunOrchestrator> {
    let gate = Arc::new(RobotsGate::new(
        settings.crawler.respect_robots_txt,
        Duration::from_secs(settings.crawler.fetch_timeout_secs),
    ));
    let limiter = Arc::new(DomainRateLimiter::new(RateLimiterConfig {
        min_delay_secs: settings.rate_limiting.min_delay_secs,
        max_delay_secs: settings.rate_limiting.max_delay_secs,
        requests_per_minute: settings.rate_limiting.requests_per_minute,
        backoff_factor: settings.rate_limiting.backoff_factor,
    }));

    let fetcher = Arc::new(Fetcher::new(
        gate,
        limiter,
        Arc::new(StaticEngine::new()),
        Arc::new(BrowserEngine::new()),
        FetcherConfig {
            user_agent: settings.crawler.user_agent.clone(),
            fetch_timeout: Duration::from_secs(settings.crawler.fetch_timeout_secs),
            rate_limited_retries: settings.crawler.rate_limited_retries,
            min_content_length: settings.crawler.min_content_length,
            render_timeout: Duration::from_secs(settings.render.timeout_secs),
            render_settle: Duration::from_millis(settings.render.settle_ms),
        },
    ));

    Arc::new(RunOrchestrator::new(
        fetcher,
        Arc::new(TemplateExtractor::new()),
        store,
    ))
}

fn build_notifier(settings: &Settings) -> Option<Arc<dyn Notifier>> {
    if !settings.alerts.enabled || settings.alerts.webhook_url.is_empty() {
        return None;
    }
    Some(Arc::new(WebhookNotifier::new(
        settings.alerts.webhook_url.clone(),
        settings.alerts.secret.clone(),
    )))
}
