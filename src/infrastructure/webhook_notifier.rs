// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::notification::Notifier;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{header, Client};
use sha2::Sha256;
use std::time::Duration;
use tracing::info;

type HmacSha256 = Hmac<Sha256>;

/// Webhook通知器
///
/// 把运行摘要POST到配置的地址。配置了密钥时在请求头附带
/// HMAC-SHA256签名。尽力而为：任何失败只向调用方返回错误，
/// 由其记录后吞掉
pub struct WebhookNotifier {
    client: Client,
    url: String,
    secret: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: String, secret: Option<String>) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("pricewatch-notify/0.1.0"),
        );
        Self {
            client: Client::builder()
                .default_headers(headers)
                .build()
                .unwrap_or_default(),
            url,
            secret,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let payload = serde_json::json!({
            "subject": subject,
            "body": body,
            "sent_at": Utc::now(),
        });

        let mut request = self
            .client
            .post(&self.url)
            .json(&payload)
            .timeout(Duration::from_secs(10));

        if let Some(secret) = &self.secret {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .map_err(|e| anyhow::anyhow!("invalid webhook secret: {}", e))?;
            mac.update(payload.to_string().as_bytes());
            let signature = hex::encode(mac.finalize().into_bytes());
            request = request.header("X-Pricewatch-Signature", signature);
        }

        let response = request.send().await?;
        response.error_for_status()?;
        info!(url = %self.url, "notification delivered");
        Ok(())
    }
}
