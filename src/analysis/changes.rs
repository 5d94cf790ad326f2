// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::analysis::price::normalize_price;
use crate::domain::models::observation::Observation;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// 分析器输入的价格值：数值直接使用，文本先归一化
#[derive(Debug, Clone)]
pub enum PriceValue {
    Number(f64),
    Text(String),
}

impl PriceValue {
    fn as_f64(&self) -> f64 {
        match self {
            PriceValue::Number(value) => *value,
            PriceValue::Text(raw) => normalize_price(raw).or_zero(),
        }
    }
}

/// 一条送入分析器的价格样本
#[derive(Debug, Clone)]
pub struct PriceSample {
    /// 商品标识
    pub product: String,
    /// 原始价格
    pub value: PriceValue,
    /// 来源
    pub source: String,
    /// 观测时间
    pub observed_at: DateTime<Utc>,
}

impl From<&Observation> for PriceSample {
    fn from(obs: &Observation) -> Self {
        Self {
            product: obs.product.clone(),
            value: PriceValue::Number(obs.price),
            source: obs.source.clone(),
            observed_at: obs.observed_at,
        }
    }
}

/// 变化判定阈值
///
/// 双阈值：绝对差与百分比都要达到，默认值挡住浮点舍入噪声
#[derive(Debug, Clone, Copy)]
pub struct ChangeThresholds {
    pub min_abs: f64,
    pub min_percent: f64,
}

impl Default for ChangeThresholds {
    fn default() -> Self {
        Self {
            min_abs: 0.01,
            min_percent: 0.01,
        }
    }
}

/// 检测价格变化
///
/// 只按商品标识分组（不区分来源——需要按来源区分的调用方
/// 自行预过滤）。每组按时间排序后比较最早与最晚的价格，
/// 最早价格必须严格为正，绝对差和百分比都达到阈值才产出信号。
/// 纯函数，无I/O，重复调用结果相同
pub fn detect_changes(
    history: &[PriceSample],
    thresholds: ChangeThresholds,
) -> HashMap<String, f64> {
    let mut grouped: HashMap<&str, Vec<(DateTime<Utc>, f64)>> = HashMap::new();
    for sample in history {
        grouped
            .entry(sample.product.as_str())
            .or_default()
            .push((sample.observed_at, sample.value.as_f64()));
    }

    let mut changes = HashMap::new();
    for (product, mut entries) in grouped {
        if entries.len() < 2 {
            continue;
        }
        entries.sort_by_key(|(at, _)| *at);

        let old_price = entries[0].1;
        let new_price = entries[entries.len() - 1].1;

        // Guard against divide-by-zero and nonsense baselines.
        if old_price <= 0.0 {
            continue;
        }

        let delta = new_price - old_price;
        let percent = delta / old_price * 100.0;
        if delta.abs() >= thresholds.min_abs && percent.abs() >= thresholds.min_percent {
            changes.insert(product.to_string(), percent);
        }
    }

    changes
}
