// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 抓取目标
///
/// 逻辑名称加一个URL，进程生命周期内不可变，由配置提供
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    /// 逻辑名称，例如 "Shop A"
    pub name: String,
    /// 目标URL
    pub url: String,
    /// 渲染抓取时等待的CSS选择器
    #[serde(default)]
    pub wait_selector: Option<String>,
}

/// 从页面提取出的一条商品条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    /// 商品标识
    pub name: String,
    /// 价格
    pub price: f64,
    /// 货币符号
    pub currency: Option<String>,
}

/// 一条归一化的价格观测记录
///
/// 交给存储协作方后即归其所有，核心不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// 商品标识
    pub product: String,
    /// 价格
    pub price: f64,
    /// 货币符号
    pub currency: Option<String>,
    /// 来源
    pub source: String,
    /// 观测时间
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    pub fn from_listing(listing: &Listing, source: &str, observed_at: DateTime<Utc>) -> Self {
        Self {
            product: listing.name.clone(),
            price: listing.price,
            currency: listing.currency.clone(),
            source: source.to_string(),
            observed_at,
        }
    }
}
