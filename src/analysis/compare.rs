// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::analysis::changes::PriceSample;

/// 名称相似度判定阈值
const SIMILARITY_THRESHOLD: f64 = 0.7;

/// 跨店比价结果
#[derive(Debug, Clone, PartialEq)]
pub struct ShopComparison {
    pub product: String,
    pub source_a: String,
    pub price_a: f64,
    pub source_b: String,
    pub price_b: f64,
    /// price_b - price_a
    pub difference: f64,
}

/// 比较不同来源间相似商品的价格
///
/// 名称按归一化Levenshtein相似度配对，同一来源内的样本不互相比较
pub fn compare_shops(history: &[PriceSample]) -> Vec<ShopComparison> {
    let mut comparisons = Vec::new();

    for (i, a) in history.iter().enumerate() {
        for b in history.iter().skip(i + 1) {
            if a.source == b.source {
                continue;
            }

            let similarity = strsim::normalized_levenshtein(
                &a.product.to_lowercase(),
                &b.product.to_lowercase(),
            );
            if similarity < SIMILARITY_THRESHOLD {
                continue;
            }

            let price_a = price_of(a);
            let price_b = price_of(b);
            comparisons.push(ShopComparison {
                product: a.product.clone(),
                source_a: a.source.clone(),
                price_a,
                source_b: b.source.clone(),
                price_b,
                difference: price_b - price_a,
            });
        }
    }

    comparisons
}

fn price_of(sample: &PriceSample) -> f64 {
    match &sample.value {
        crate::analysis::changes::PriceValue::Number(v) => *v,
        crate::analysis::changes::PriceValue::Text(raw) => {
            crate::analysis::price::normalize_price(raw).or_zero()
        }
    }
}
