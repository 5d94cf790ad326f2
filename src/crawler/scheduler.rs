// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::crawler::orchestrator::RunOrchestrator;
use crate::domain::models::observation::Source;
use crate::domain::services::notification::Notifier;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// 周期调度器
///
/// 运行 -> 休眠 -> 运行，直到外部取消。不做漂移校正：
/// 每次休眠从上一轮结束算起，实际周期 = 运行时长 + 配置间隔。
/// 休眠可被取消信号打断，取消在运行和休眠期间都可被观察到
pub struct Scheduler {
    orchestrator: Arc<RunOrchestrator>,
    sources: Vec<Source>,
    interval: Duration,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Scheduler {
    pub fn new(
        orchestrator: Arc<RunOrchestrator>,
        sources: Vec<Source>,
        interval: Duration,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            orchestrator,
            sources,
            interval,
            notifier,
        }
    }

    /// 运行调度循环直到收到停止信号
    ///
    /// 编排器层面的意外失败对循环是致命的并向上传播；
    /// 单来源失败在编排器内部消化，通知失败只记日志
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(interval_secs = self.interval.as_secs(), "scheduler started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let count = match self
                .orchestrator
                .run_once_cancellable(&self.sources, Some(&shutdown))
                .await
            {
                Ok(count) => count,
                Err(e) => {
                    error!("orchestrator failed, stopping scheduler: {:#}", e);
                    return Err(e);
                }
            };
            info!(count, "scheduled run finished");

            if let Some(notifier) = &self.notifier {
                let body = format!("Collected {} price records at {}", count, Utc::now());
                if let Err(e) = notifier.notify("pricewatch run finished", &body).await {
                    // Best effort only; a broken notifier never pauses the loop.
                    warn!("notification failed: {:#}", e);
                }
            }

            tokio::select! {
                _ = sleep(self.interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("scheduler stopped");
        Ok(())
    }
}
