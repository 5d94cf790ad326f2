// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

/// 价格归一化结果
///
/// 显式区分"确认为零的价格"和"无法解析"，避免数据质量
/// 问题被静默的零值掩盖
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedPrice {
    Parsed(f64),
    Unparseable,
}

impl ParsedPrice {
    /// 兼容旧存量数据的取值方式：无法解析按0.0处理
    pub fn or_zero(self) -> f64 {
        match self {
            ParsedPrice::Parsed(value) => value,
            ParsedPrice::Unparseable => 0.0,
        }
    }
}

static NUMERIC_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("numeric pattern"));

/// 把价格文本归一化为数值
///
/// 规则：先剥掉HTML标记；逗号和点同时出现时逗号是千位分隔符，
/// 只有逗号时逗号是小数点；然后取第一个数字片段
pub fn normalize_price(raw: &str) -> ParsedPrice {
    let mut text = raw.trim().to_string();
    if text.is_empty() {
        return ParsedPrice::Unparseable;
    }

    if text.contains('<') {
        text = Html::parse_fragment(&text)
            .root_element()
            .text()
            .collect::<String>();
    }

    let cleaned = if text.contains(',') && text.contains('.') {
        text.replace(',', "")
    } else {
        text.replace(',', ".")
    };

    match NUMERIC_TOKEN.find(&cleaned) {
        Some(token) => match token.as_str().parse::<f64>() {
            Ok(value) => ParsedPrice::Parsed(value),
            Err(_) => ParsedPrice::Unparseable,
        },
        None => ParsedPrice::Unparseable,
    }
}
