// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::crawler::rate_limiter::DomainRateLimiter;
use crate::crawler::robots::RobotsGate;
use crate::engines::traits::{EngineError, FetchEngine, PageRequest};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// 抓取失败类型
///
/// Fetcher边界之外不传播任何panic或底层错误，
/// 每种结果都是调用方必须分支处理的标签
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FetchError {
    /// robots.txt拒绝，不重试
    #[error("blocked by robots.txt")]
    RobotsDenied,
    /// 重试预算用尽后仍被429拒绝
    #[error("rate limited by server")]
    RateLimited,
    /// 网络错误或非2xx响应，本轮跳过该来源
    #[error("network error: {0}")]
    Network(String),
    /// 渲染抓取超时
    #[error("rendered fetch timed out")]
    RenderTimeout,
}

/// 一次成功抓取的页面
#[derive(Debug)]
pub struct FetchedPage {
    pub html: String,
    /// 字节长度，用于判断内容是否足以包含真实条目
    pub length: usize,
}

/// Fetcher配置
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_agent: String,
    /// 静态抓取超时
    pub fetch_timeout: Duration,
    /// 每次抓取调用在429后的额外尝试次数
    pub rate_limited_retries: u32,
    /// 低于该字节数的静态结果升级为渲染抓取
    pub min_content_length: usize,
    /// 渲染抓取整体超时
    pub render_timeout: Duration,
    /// 渲染无选择器提示时的固定等待
    pub render_settle: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: "pricewatch-bot/0.1".to_string(),
            fetch_timeout: Duration::from_secs(10),
            rate_limited_retries: 1,
            min_content_length: 1024,
            render_timeout: Duration::from_secs(30),
            render_settle: Duration::from_millis(2000),
        }
    }
}

/// 单URL抓取器
///
/// 每次尝试都走完整序列：Robots闸门 -> 限速等待 -> 网络请求。
/// 429重试也重复整个序列，因为间隔策略可能在此期间已被放宽
pub struct Fetcher {
    gate: Arc<RobotsGate>,
    limiter: Arc<DomainRateLimiter>,
    static_engine: Arc<dyn FetchEngine>,
    browser_engine: Arc<dyn FetchEngine>,
    config: FetcherConfig,
}

impl Fetcher {
    pub fn new(
        gate: Arc<RobotsGate>,
        limiter: Arc<DomainRateLimiter>,
        static_engine: Arc<dyn FetchEngine>,
        browser_engine: Arc<dyn FetchEngine>,
        config: FetcherConfig,
    ) -> Self {
        Self {
            gate,
            limiter,
            static_engine,
            browser_engine,
            config,
        }
    }

    /// 静态抓取一个URL
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let request = PageRequest {
            url: url.to_string(),
            user_agent: self.config.user_agent.clone(),
            timeout: self.config.fetch_timeout,
            wait_selector: None,
            settle: self.config.render_settle,
        };
        self.fetch_with_engine(&*self.static_engine, &request, false)
            .await
    }

    /// 渲染抓取一个URL
    ///
    /// 与静态抓取共用闸门、限速与429处理；渲染结果不再升级
    pub async fn fetch_rendered(
        &self,
        url: &str,
        wait_selector: Option<&str>,
    ) -> Result<FetchedPage, FetchError> {
        let request = PageRequest {
            url: url.to_string(),
            user_agent: self.config.user_agent.clone(),
            timeout: self.config.render_timeout,
            wait_selector: wait_selector.map(|s| s.to_string()),
            settle: self.config.render_settle,
        };
        self.fetch_with_engine(&*self.browser_engine, &request, true)
            .await
    }

    /// 先静态抓取，不足时升级为渲染抓取
    ///
    /// 静态结果缺失（robots拒绝除外，闸门裁决是确定性的）或内容
    /// 短于阈值时，改用渲染抓取并以其结果为准
    pub async fn fetch_with_fallback(
        &self,
        url: &str,
        wait_selector: Option<&str>,
    ) -> Result<FetchedPage, FetchError> {
        match self.fetch(url).await {
            Ok(page) if page.length >= self.config.min_content_length => Ok(page),
            Ok(page) => {
                debug!(
                    url,
                    length = page.length,
                    "static content too short, escalating to rendered fetch"
                );
                self.fetch_rendered(url, wait_selector).await
            }
            Err(FetchError::RobotsDenied) => Err(FetchError::RobotsDenied),
            Err(reason) => {
                debug!(url, %reason, "static fetch failed, escalating to rendered fetch");
                self.fetch_rendered(url, wait_selector).await
            }
        }
    }

    async fn fetch_with_engine(
        &self,
        engine: &dyn FetchEngine,
        request: &PageRequest,
        rendered: bool,
    ) -> Result<FetchedPage, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            // The full sequence repeats on every attempt: the delay range
            // may have widened since the previous pass.
            if !self
                .gate
                .can_fetch(&request.url, &self.config.user_agent)
                .await
            {
                return Err(FetchError::RobotsDenied);
            }

            self.limiter.wait(&request.url).await;

            match engine.fetch(request).await {
                Ok(response) if (200..300).contains(&response.status_code) => {
                    let length = response.content.len();
                    return Ok(FetchedPage {
                        html: response.content,
                        length,
                    });
                }
                Ok(response) if response.status_code == 429 => {
                    self.limiter.on_rate_limited(&request.url);
                    if attempt >= self.config.rate_limited_retries {
                        return Err(FetchError::RateLimited);
                    }
                    attempt += 1;
                    warn!(
                        url = %request.url,
                        engine = engine.name(),
                        attempt,
                        "rate limited, retrying with widened delays"
                    );
                }
                Ok(response) => {
                    return Err(FetchError::Network(format!(
                        "unexpected status {}",
                        response.status_code
                    )));
                }
                Err(EngineError::Timeout) if rendered => {
                    return Err(FetchError::RenderTimeout);
                }
                Err(e) => {
                    return Err(FetchError::Network(e.to_string()));
                }
            }
        }
    }
}
