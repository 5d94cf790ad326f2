// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::observation::Listing;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// 提取协作方接口
///
/// 纯函数：输入HTML，输出商品条目。空结果不是错误，
/// 由调用方决定是否升级为渲染抓取
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> Vec<Listing>;
}

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^\d]+)?([\d.,]+)").expect("price pattern"));

/// 把价格文本拆成数值和货币符号，例如 "£63.00" -> (63.0, "£")
pub fn parse_price(raw: &str) -> (f64, Option<String>) {
    let trimmed = raw.trim();
    let Some(caps) = PRICE_RE.captures(trimmed) else {
        return (0.0, None);
    };

    let currency = caps
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());

    let value = caps
        .get(2)
        .map(|m| m.as_str().replace(',', "."))
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);

    (value, currency)
}

struct SiteTemplate {
    item: Selector,
    name: Selector,
    /// name选择器命中元素上承载名称的属性，None表示取文本
    name_attr: Option<&'static str>,
    price: Selector,
}

static TEMPLATES: Lazy<Vec<SiteTemplate>> = Lazy::new(|| {
    let sel = |s: &str| Selector::parse(s).expect("static selector");
    vec![
        // WooCommerce shops (scrapeme.live)
        SiteTemplate {
            item: sel("li.product"),
            name: sel("h2.woocommerce-loop-product__title"),
            name_attr: None,
            price: sel("span.woocommerce-Price-amount"),
        },
        // books.toscrape.com
        SiteTemplate {
            item: sel("article.product_pod"),
            name: sel("h3 a[title]"),
            name_attr: Some("title"),
            price: sel("p.price_color"),
        },
    ]
});

/// 基于固定站点模板的提取器
///
/// 依次尝试每个模板，第一个命中的模板决定解析结果
pub struct TemplateExtractor;

impl TemplateExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_with(template: &SiteTemplate, document: &Html) -> Vec<Listing> {
        let mut listings = Vec::new();
        for item in document.select(&template.item) {
            let name = item.select(&template.name).next().and_then(|el| {
                match template.name_attr {
                    Some(attr) => el.value().attr(attr).map(|s| s.to_string()),
                    None => Some(text_of(el)),
                }
            });
            let price_text = item.select(&template.price).next().map(text_of);

            if let (Some(name), Some(price_text)) = (name, price_text) {
                let (price, currency) = parse_price(&price_text);
                listings.push(Listing {
                    name,
                    price,
                    currency,
                });
            }
        }
        listings
    }
}

impl Default for TemplateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for TemplateExtractor {
    fn extract(&self, html: &str) -> Vec<Listing> {
        let document = Html::parse_document(html);

        for template in TEMPLATES.iter() {
            // A template counts as matching when its item selector hits at all.
            if document.select(&template.item).next().is_some() {
                return Self::extract_with(template, &document);
            }
        }

        debug!("no site template matched the page structure");
        Vec::new()
    }
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").trim().to_string()
}
