// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::url_utils::domain_key;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// 滚动窗口长度
const WINDOW: Duration = Duration::from_secs(60);
/// 窗口满时的轮询步长，保证等待以短增量进行
const WINDOW_POLL: Duration = Duration::from_millis(500);

/// 限速器配置
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// 初始最小请求间隔（秒）
    pub min_delay_secs: f64,
    /// 初始最大请求间隔（秒）
    pub max_delay_secs: f64,
    /// 每域每60秒窗口允许的请求数
    pub requests_per_minute: usize,
    /// 收到429后间隔区间的放大倍数
    pub backoff_factor: f64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 2.0,
            max_delay_secs: 5.0,
            requests_per_minute: 20,
            backoff_factor: 2.0,
        }
    }
}

/// 单个域的限速状态
#[derive(Debug)]
struct DomainState {
    /// 上一次请求时间
    last_request: Option<Instant>,
    /// 滚动窗口内的请求时间戳
    window: VecDeque<Instant>,
    /// 当前间隔区间下界（秒）
    delay_min: f64,
    /// 当前间隔区间上界（秒）
    delay_max: f64,
}

impl DomainState {
    fn new(config: &RateLimiterConfig) -> Self {
        Self {
            last_request: None,
            window: VecDeque::new(),
            delay_min: config.min_delay_secs,
            delay_max: config.max_delay_secs,
        }
    }
}

/// 按域限速器
///
/// 每个域独立维护：最小请求间隔（从(min,max)区间均匀抽取）、
/// 60秒滚动请求预算、以及429触发的退避。退避在一次运行内只增不减。
/// 纯进程内实现，不做跨进程协调
pub struct DomainRateLimiter {
    config: RateLimiterConfig,
    domains: DashMap<String, DomainState>,
}

impl DomainRateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        let mut config = config;
        // A zero budget would block forever; one request per window is the floor.
        config.requests_per_minute = config.requests_per_minute.max(1);
        // An inverted range would panic when sampling; collapse it onto the minimum.
        if config.max_delay_secs < config.min_delay_secs {
            config.max_delay_secs = config.min_delay_secs;
        }
        Self {
            config,
            domains: DashMap::new(),
        }
    }

    /// 阻塞到对该URL所属域发起请求是安全的为止
    ///
    /// 先等滚动窗口腾出名额，再按当前(min,max)区间抽取的间隔
    /// 补足与上一次请求的距离，最后把"现在"记入窗口。名额检查
    /// 与记录在同一把锁下完成，并发调用不会超出窗口预算
    pub async fn wait(&self, url: &str) {
        let domain = domain_key(url).unwrap_or_else(|| url.to_string());

        // Randomized spacing from the domain's current delay range.
        let spacing = {
            let state = self
                .domains
                .entry(domain.clone())
                .or_insert_with(|| DomainState::new(&self.config));
            Duration::from_secs_f64(rand::random_range(state.delay_min..=state.delay_max))
        };

        loop {
            let pause = {
                let mut state = self
                    .domains
                    .entry(domain.clone())
                    .or_insert_with(|| DomainState::new(&self.config));

                while let Some(front) = state.window.front() {
                    if front.elapsed() >= WINDOW {
                        state.window.pop_front();
                    } else {
                        break;
                    }
                }

                if state.window.len() >= self.config.requests_per_minute {
                    debug!(%domain, "request budget exhausted, waiting for window slot");
                    state
                        .window
                        .front()
                        .map(|oldest| WINDOW.saturating_sub(oldest.elapsed()).min(WINDOW_POLL))
                } else {
                    match state
                        .last_request
                        .map(|last| spacing.saturating_sub(last.elapsed()))
                        .filter(|d| !d.is_zero())
                    {
                        Some(remaining) => Some(remaining),
                        None => {
                            // Slot confirmed and spacing satisfied under the
                            // same guard that records the request.
                            let now = Instant::now();
                            state.last_request = Some(now);
                            state.window.push_back(now);
                            None
                        }
                    }
                }
            };

            match pause {
                Some(remaining) => sleep(remaining).await,
                None => break,
            }
        }
    }

    /// 记录一次429拒绝，放大该域的间隔区间
    ///
    /// 放大是累积的，且在本次运行内不会自动恢复
    pub fn on_rate_limited(&self, url: &str) {
        let domain = domain_key(url).unwrap_or_else(|| url.to_string());
        let mut state = self
            .domains
            .entry(domain.clone())
            .or_insert_with(|| DomainState::new(&self.config));

        state.delay_min *= self.config.backoff_factor;
        state.delay_max *= self.config.backoff_factor;
        warn!(
            %domain,
            delay_min = state.delay_min,
            delay_max = state.delay_max,
            "server rejected request, widening delay range"
        );
    }

    /// 当前间隔区间（秒），未见过的域返回配置初值
    pub fn current_delay_range(&self, url: &str) -> (f64, f64) {
        let domain = domain_key(url).unwrap_or_else(|| url.to_string());
        match self.domains.get(&domain) {
            Some(state) => (state.delay_min, state.delay_max),
            None => (self.config.min_delay_secs, self.config.max_delay_secs),
        }
    }
}
