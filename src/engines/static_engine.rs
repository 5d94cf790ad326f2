// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, FetchEngine, PageRequest, PageResponse};
use async_trait::async_trait;
use reqwest::Client;

/// 静态抓取引擎
///
/// 基于reqwest实现的基本HTTP抓取引擎，不执行页面脚本
pub struct StaticEngine {
    client: Client,
}

impl StaticEngine {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for StaticEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FetchEngine for StaticEngine {
    /// 执行HTTP抓取
    ///
    /// # 参数
    ///
    /// * `request` - 页面请求
    ///
    /// # 返回值
    ///
    /// * `Ok(PageResponse)` - 状态码与页面内容，状态码由调用方分类
    /// * `Err(EngineError)` - 抓取过程中出现的错误
    async fn fetch(&self, request: &PageRequest) -> Result<PageResponse, EngineError> {
        let response = self
            .client
            .get(&request.url)
            .header("User-Agent", &request.user_agent)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Timeout
                } else {
                    EngineError::RequestFailed(e)
                }
            })?;

        let status_code = response.status().as_u16();
        // Body decoding errors are treated as an empty page rather than
        // a failed fetch; the status code still tells the caller what happened.
        let content = response.text().await.unwrap_or_default();

        Ok(PageResponse {
            status_code,
            content,
        })
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
