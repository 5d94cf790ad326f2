// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::url_utils::{domain_key, robots_url};
use dashmap::DashMap;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use std::time::Duration;
use tracing::{debug, warn};

/// 单个域缓存的robots.txt记录
enum RobotsRecord {
    /// 成功取回的规则文本（404视为空规则）
    Rules(String),
    /// 取回失败的哨兵，之后对该域一律放行
    Unreachable,
}

/// Robots闸门
///
/// 按域缓存robots.txt裁决。首次询问某个域时取回并解析其
/// /robots.txt；取回或解析失败时缓存"无规则"哨兵并默认放行——
/// 过度拦截会悄悄停掉一个本来合规的来源。缓存没有TTL，
/// 进程生命周期即一次抓取会话
pub struct RobotsGate {
    client: Client,
    cache: DashMap<String, RobotsRecord>,
    /// 全局开关，关闭后不查询也不写缓存
    enabled: bool,
    fetch_timeout: Duration,
}

impl RobotsGate {
    pub fn new(enabled: bool, fetch_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            cache: DashMap::new(),
            enabled,
            fetch_timeout,
        }
    }

    /// 判断是否允许以该agent抓取该URL
    ///
    /// 先查缓存，未命中则取回一次robots.txt。失败不重试
    pub async fn can_fetch(&self, url: &str, user_agent: &str) -> bool {
        if !self.enabled {
            return true;
        }

        let Some(domain) = domain_key(url) else {
            // Malformed URLs are let through so the fetch surfaces the real error.
            return true;
        };

        if let Some(record) = self.cache.get(&domain) {
            return Self::evaluate(&record, url, user_agent);
        }

        let record = self.retrieve(&domain).await;
        let allowed = Self::evaluate(&record, url, user_agent);
        self.cache.insert(domain, record);
        allowed
    }

    async fn retrieve(&self, domain: &str) -> RobotsRecord {
        let robots = robots_url(domain);
        debug!(%robots, "retrieving robots.txt");

        let response = self
            .client
            .get(&robots)
            .timeout(self.fetch_timeout)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => RobotsRecord::Rules(body),
                Err(e) => {
                    warn!(%robots, "failed to read robots.txt body: {}", e);
                    RobotsRecord::Unreachable
                }
            },
            // 404 means the site publishes no rules; that is a valid answer.
            Ok(resp) if resp.status() == reqwest::StatusCode::NOT_FOUND => {
                RobotsRecord::Rules(String::new())
            }
            Ok(resp) => {
                warn!(%robots, status = %resp.status(), "unexpected robots.txt status, defaulting to allow");
                RobotsRecord::Unreachable
            }
            Err(e) => {
                warn!(%robots, "failed to retrieve robots.txt: {}", e);
                RobotsRecord::Unreachable
            }
        }
    }

    fn evaluate(record: &RobotsRecord, url: &str, user_agent: &str) -> bool {
        match record {
            RobotsRecord::Rules(body) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(body, user_agent, url)
            }
            RobotsRecord::Unreachable => true,
        }
    }
}
