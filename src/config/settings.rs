// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::observation::Source;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含抓取、限速、渲染、存储、通知和分析的所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 抓取配置
    pub crawler: CrawlerSettings,
    /// 限速配置
    pub rate_limiting: RateLimitingSettings,
    /// 渲染抓取配置
    pub render: RenderSettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 通知配置
    pub alerts: AlertSettings,
    /// 分析配置
    pub analysis: AnalysisSettings,
    /// 抓取目标列表，空则使用内置默认
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// 抓取配置设置
#[derive(Debug, Deserialize)]
pub struct CrawlerSettings {
    /// 对外标识的User-Agent
    pub user_agent: String,
    /// 轮询间隔（分钟）
    pub interval_minutes: u64,
    /// 是否遵守robots.txt
    pub respect_robots_txt: bool,
    /// 静态抓取超时（秒）
    pub fetch_timeout_secs: u64,
    /// 429后的额外尝试次数
    pub rate_limited_retries: u32,
    /// 渲染升级的内容长度阈值（字节）
    pub min_content_length: usize,
}

/// 限速配置设置
#[derive(Debug, Deserialize)]
pub struct RateLimitingSettings {
    /// 初始最小请求间隔（秒）
    pub min_delay_secs: f64,
    /// 初始最大请求间隔（秒）
    pub max_delay_secs: f64,
    /// 每域每分钟请求预算
    pub requests_per_minute: usize,
    /// 429退避倍数
    pub backoff_factor: f64,
}

/// 渲染抓取配置设置
#[derive(Debug, Deserialize)]
pub struct RenderSettings {
    /// 渲染整体超时（秒）
    pub timeout_secs: u64,
    /// 无选择器提示时的固定等待（毫秒）
    pub settle_ms: u64,
}

/// 存储配置设置
#[derive(Debug, Deserialize)]
pub struct StorageSettings {
    /// SQLite数据库文件路径
    pub database_path: String,
}

/// 通知配置设置
#[derive(Debug, Deserialize)]
pub struct AlertSettings {
    /// 是否在每轮结束后通知
    pub enabled: bool,
    /// Webhook地址
    pub webhook_url: String,
    /// 签名密钥，空则不签名
    pub secret: Option<String>,
}

/// 分析配置设置
#[derive(Debug, Deserialize)]
pub struct AnalysisSettings {
    /// 报告回看天数
    pub window_days: i64,
    /// 绝对变化阈值
    pub min_abs_change: f64,
    /// 百分比变化阈值
    pub min_percent_change: f64,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从默认值、可选配置文件和环境变量加载配置
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default crawler settings
            .set_default("crawler.user_agent", "pricewatch-bot/0.1")?
            .set_default("crawler.interval_minutes", 60)?
            .set_default("crawler.respect_robots_txt", true)?
            .set_default("crawler.fetch_timeout_secs", 10)?
            .set_default("crawler.rate_limited_retries", 1)?
            .set_default("crawler.min_content_length", 1024)?
            // Default rate limiting settings
            .set_default("rate_limiting.min_delay_secs", 2.0)?
            .set_default("rate_limiting.max_delay_secs", 5.0)?
            .set_default("rate_limiting.requests_per_minute", 20)?
            .set_default("rate_limiting.backoff_factor", 2.0)?
            // Default render settings
            .set_default("render.timeout_secs", 30)?
            .set_default("render.settle_ms", 2000)?
            // Default storage settings
            .set_default("storage.database_path", "pricewatch.db")?
            // Default alert settings
            .set_default("alerts.enabled", false)?
            .set_default("alerts.webhook_url", "")?
            // Default analysis settings
            .set_default("analysis.window_days", 7)?
            .set_default("analysis.min_abs_change", 0.01)?
            .set_default("analysis.min_percent_change", 0.01)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("PRICEWATCH").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// 内置的默认抓取目标
    pub fn default_sources() -> Vec<Source> {
        vec![
            Source {
                name: "Shop A".to_string(),
                url: "https://scrapeme.live/shop/".to_string(),
                wait_selector: Some("li.product".to_string()),
            },
            Source {
                name: "Shop B".to_string(),
                url: "https://books.toscrape.com/catalogue/category/books_1/index.html"
                    .to_string(),
                wait_selector: Some("article.product_pod".to_string()),
            },
            Source {
                name: "Shop C".to_string(),
                url: "https://webscraper.io/test-sites/e-commerce/allinone/computers/laptops"
                    .to_string(),
                wait_selector: Some(".thumbnail".to_string()),
            },
        ]
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
