// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::crawler::fetcher::Fetcher;
use crate::domain::models::observation::Source;
use crate::domain::repositories::observation_store::ObservationStore;
use crate::domain::services::extraction::Extractor;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// 静态标记完全不含条目的站点用的通用内容选择器提示
const GENERIC_LISTING_HINT: &str = "li.product, article.product_pod, .thumbnail";

/// 单轮运行编排器
///
/// 逐个来源驱动 抓取 -> 提取 -> 存储，单个来源的失败被记录
/// 后不影响其余来源。返回本轮成功提取的记录总数
pub struct RunOrchestrator {
    fetcher: Arc<Fetcher>,
    extractor: Arc<dyn Extractor>,
    store: Arc<dyn ObservationStore>,
}

impl RunOrchestrator {
    pub fn new(
        fetcher: Arc<Fetcher>,
        extractor: Arc<dyn Extractor>,
        store: Arc<dyn ObservationStore>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            store,
        }
    }

    /// 执行一轮抓取
    pub async fn run_once(&self, sources: &[Source]) -> Result<usize> {
        self.run_once_cancellable(sources, None).await
    }

    /// 执行一轮抓取，在来源边界处观察取消信号
    ///
    /// 正在处理的来源会完成；取消只在下一个来源开始前生效
    pub async fn run_once_cancellable(
        &self,
        sources: &[Source],
        cancel: Option<&watch::Receiver<bool>>,
    ) -> Result<usize> {
        let mut total = 0usize;

        for source in sources {
            if let Some(cancel) = cancel {
                if *cancel.borrow() {
                    info!("cancellation observed, skipping remaining sources");
                    break;
                }
            }

            match self.scrape_source(source).await {
                Ok(count) => {
                    info!(source = %source.name, count, "source scraped");
                    total += count;
                }
                Err(e) => {
                    // Partial-failure isolation: one broken source must not
                    // abort the others.
                    warn!(source = %source.name, "source failed: {:#}", e);
                }
            }
        }

        Ok(total)
    }

    async fn scrape_source(&self, source: &Source) -> Result<usize> {
        let page = self
            .fetcher
            .fetch_with_fallback(&source.url, source.wait_selector.as_deref())
            .await
            .context("fetch failed")?;

        let mut listings = self.extractor.extract(&page.html);

        if listings.is_empty() {
            // Some sites serve markup with no listings at all unless scripts
            // run; one rendered re-attempt with a generic hint covers those.
            info!(source = %source.name, "extraction yielded nothing, re-trying rendered");
            let rendered = self
                .fetcher
                .fetch_rendered(&source.url, Some(GENERIC_LISTING_HINT))
                .await
                .context("rendered re-attempt failed")?;
            listings = self.extractor.extract(&rendered.html);
        }

        if listings.is_empty() {
            return Ok(0);
        }

        // All records from one source in one run share a single timestamp.
        let observed_at = Utc::now();
        self.store
            .append(&listings, &source.name, observed_at)
            .await
            .context("failed to store records")?;

        Ok(listings.len())
    }
}
