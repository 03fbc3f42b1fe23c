// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::Selector;
use serde_json::Value;

use super::{
    collapse_whitespace, parse_datetime, ExtractionStrategy, PageContext, SelectorTracker,
    StrategyOutput,
};
use crate::domain::models::article::ExtractionMethod;

const LD_JSON_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// 视为文章的 schema.org 类型
const ARTICLE_TYPES: &[&str] = &[
    "NewsArticle",
    "Article",
    "ReportageNewsArticle",
    "AnalysisNewsArticle",
    "BlogPosting",
];

/// 结构化数据策略
///
/// 读取页面内嵌的 JSON-LD，支持单对象、数组以及 `@graph` 包装。
pub struct StructuredDataStrategy;

impl ExtractionStrategy for StructuredDataStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::StructuredData
    }

    fn attempt(
        &self,
        page: &PageContext<'_>,
        tracker: &mut SelectorTracker,
    ) -> Option<StrategyOutput> {
        let selector = Selector::parse(LD_JSON_SELECTOR).ok()?;
        let method = self.method();

        for script in page.document.select(&selector) {
            let raw = script.text().collect::<String>();
            let Ok(value) = serde_json::from_str::<Value>(raw.trim()) else {
                tracker.record("body", LD_JSON_SELECTOR, method, None);
                continue;
            };

            let Some(article) = find_article(&value) else {
                continue;
            };

            let body = article.get("articleBody").and_then(Value::as_str);
            tracker.record("body", "articleBody", method, body);
            let Some(body) = body else {
                continue;
            };

            let paragraphs = split_paragraphs(body);
            if paragraphs.is_empty() {
                continue;
            }

            let title = article
                .get("headline")
                .or_else(|| article.get("name"))
                .and_then(Value::as_str)
                .map(collapse_whitespace)
                .filter(|t| !t.is_empty());
            tracker.record("title", "headline", method, title.as_deref());

            let author = article.get("author").and_then(author_name);
            tracker.record("author", "author", method, author.as_deref());

            let published_raw = article.get("datePublished").and_then(Value::as_str);
            tracker.record("published_at", "datePublished", method, published_raw);

            return Some(StrategyOutput {
                title,
                paragraphs,
                author,
                published_at: published_raw.and_then(parse_datetime),
            });
        }

        None
    }
}

/// 在 JSON-LD 树中查找第一个文章节点
fn find_article(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_article),
        Value::Object(map) => {
            if is_article_type(map.get("@type")) {
                return Some(value);
            }
            map.get("@graph").and_then(find_article)
        }
        _ => None,
    }
}

fn is_article_type(type_value: Option<&Value>) -> bool {
    match type_value {
        Some(Value::String(t)) => ARTICLE_TYPES.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| ARTICLE_TYPES.contains(&t)),
        _ => false,
    }
}

/// author 可以是字符串、带 name 的对象或它们的数组
fn author_name(value: &Value) -> Option<String> {
    let name = match value {
        Value::String(name) => Some(name.clone()),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
        Value::Array(items) => {
            let names: Vec<String> = items.iter().filter_map(author_name).collect();
            (!names.is_empty()).then(|| names.join(", "))
        }
        _ => None,
    }?;
    let name = collapse_whitespace(&name);
    (!name.is_empty()).then_some(name)
}

/// articleBody 按空行或换行拆段
fn split_paragraphs(body: &str) -> Vec<String> {
    body.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}
