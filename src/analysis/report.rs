// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::analysis::changes::{detect_changes, ChangeThresholds, PriceSample};
use crate::analysis::compare::{compare_shops, ShopComparison};
use crate::domain::repositories::observation_store::ObservationStore;
use anyhow::Result;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::fmt::Write as _;

/// 展示的跨店比价条数上限
const MAX_COMPARISONS: usize = 20;

/// 报告配置
#[derive(Debug, Clone, Copy)]
pub struct ReportConfig {
    /// 回看天数
    pub window_days: i64,
    pub thresholds: ChangeThresholds,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            thresholds: ChangeThresholds::default(),
        }
    }
}

/// 一次离线分析的结果
#[derive(Debug)]
pub struct Report {
    pub window_days: i64,
    pub changes: HashMap<String, f64>,
    pub comparisons: Vec<ShopComparison>,
}

/// 对存储的观测历史做一次分析
pub async fn generate_report(store: &dyn ObservationStore, config: ReportConfig) -> Result<Report> {
    let since = Utc::now() - Duration::days(config.window_days);
    let history = store.load_history(since).await?;
    let samples: Vec<PriceSample> = history.iter().map(PriceSample::from).collect();

    Ok(Report {
        window_days: config.window_days,
        changes: detect_changes(&samples, config.thresholds),
        comparisons: compare_shops(&samples),
    })
}

/// 渲染为人读文本
pub fn render(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "===== price analysis ({} days) =====", report.window_days);

    let _ = writeln!(out, "\n>>> price changes:");
    if report.changes.is_empty() {
        let _ = writeln!(out, "no price changes in the window.");
    } else {
        let mut changes: Vec<_> = report.changes.iter().collect();
        changes.sort_by(|a, b| a.0.cmp(b.0));
        for (product, percent) in changes {
            let direction = if *percent > 0.0 { "up" } else { "down" };
            let _ = writeln!(out, "- {}: {} {:.1}%", product, direction, percent);
        }
    }

    let _ = writeln!(out, "\n>>> shop comparison:");
    if report.comparisons.is_empty() {
        let _ = writeln!(out, "no similar products across shops in the window.");
    } else {
        for c in report.comparisons.iter().take(MAX_COMPARISONS) {
            let verdict = if c.difference > 0.0 { "cheaper" } else { "pricier" };
            let _ = writeln!(
                out,
                "- {}: {} {:.2} vs {} {:.2} ({} by {:.2})",
                c.product,
                c.source_a,
                c.price_a,
                c.source_b,
                c.price_b,
                verdict,
                c.difference.abs()
            );
        }
    }

    out
}
