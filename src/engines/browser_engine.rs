// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, FetchEngine, PageRequest, PageResponse};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::OnceCell;

// Global browser instance to avoid re-launching Chrome on every request.
static BROWSER_INSTANCE: OnceCell<Browser> = OnceCell::const_new();

// Asynchronously gets or initializes the shared browser instance.
// This function ensures that the browser is launched only once.
async fn get_browser() -> Result<&'static Browser, EngineError> {
    BROWSER_INSTANCE
        .get_or_try_init(|| async {
            let config = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(Duration::from_secs(30))
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .build()
                .map_err(EngineError::Browser)?;

            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?;

            // Spawn a handler to process browser events
            tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(browser)
        })
        .await
}

/// 浏览器渲染引擎
///
/// 基于chromiumoxide的无头浏览器引擎，在捕获内容前执行页面脚本。
/// 静态抓取拿不到真实内容时作为升级手段使用
pub struct BrowserEngine {
    /// 等待选择器出现时的轮询间隔
    poll_interval: Duration,
}

impl BrowserEngine {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
        }
    }

    /// 在已打开的页面上完成 导航 -> 等待 -> 捕获
    async fn render(&self, page: &Page, request: &PageRequest) -> Result<PageResponse, EngineError> {
        // The gate checked robots with our agent; navigation must present it too.
        page.set_user_agent(request.user_agent.as_str())
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

        page.goto(request.url.as_str())
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

        match &request.wait_selector {
            Some(selector) => {
                // Poll until the selector appears; the caller's timeout bounds this.
                while page.find_element(selector.as_str()).await.is_err() {
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
            None => {
                tokio::time::sleep(request.settle).await;
            }
        }

        let content = page
            .content()
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

        // CDP does not surface the HTTP status here; a rendered page is a 200.
        Ok(PageResponse {
            status_code: 200,
            content,
        })
    }
}

impl Default for BrowserEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FetchEngine for BrowserEngine {
    /// 执行渲染抓取
    ///
    /// 打开页面后等待`wait_selector`出现，未提供选择器则等待固定的
    /// settle时间，随后捕获渲染完成的HTML
    ///
    /// # 返回值
    ///
    /// * `Ok(PageResponse)` - 渲染后的页面内容
    /// * `Err(EngineError::Timeout)` - 整体超时
    /// * `Err(EngineError::Browser)` - 浏览器不可用或页面操作失败
    async fn fetch(&self, request: &PageRequest) -> Result<PageResponse, EngineError> {
        let browser = get_browser().await?;

        // The page handle lives outside the timed scope: the browser is
        // shared for the whole process, so the tab must be closed on the
        // timeout and error paths too, not just on success.
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

        let result = tokio::time::timeout(request.timeout, self.render(&page, request))
            .await
            .unwrap_or(Err(EngineError::Timeout));

        let _ = page.close().await;
        result
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}
