// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 浏览器错误
    #[error("browser error: {0}")]
    Browser(String),
    /// 超时
    #[error("timeout")]
    Timeout,
}

/// 页面请求
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// 目标URL
    pub url: String,
    /// User-Agent
    pub user_agent: String,
    /// 整体超时时间
    pub timeout: Duration,
    /// 渲染时等待出现的CSS选择器
    pub wait_selector: Option<String>,
    /// 无选择器时的固定等待时间
    pub settle: Duration,
}

/// 页面响应
#[derive(Debug)]
pub struct PageResponse {
    /// HTTP状态码
    pub status_code: u16,
    /// 响应内容
    pub content: String,
}

/// 抓取引擎特质
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// 执行抓取
    async fn fetch(&self, request: &PageRequest) -> Result<PageResponse, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
