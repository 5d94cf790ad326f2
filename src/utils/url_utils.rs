// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

/// 计算URL的域标识
///
/// 机器人规则与限速状态均以 scheme+authority 为分区键
pub fn domain_key(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    let key = match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    };
    Some(key)
}

/// 根据域标识拼出robots.txt地址
pub fn robots_url(domain: &str) -> String {
    format!("{}/robots.txt", domain)
}
