// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::{
    parse_datetime, select_attr, visible_text, ExtractionStrategy, PageContext, SelectorTracker,
    StrategyOutput,
};
use crate::domain::models::article::ExtractionMethod;

const DESCRIPTION_SELECTORS: &[&str] = &[
    r#"meta[property="og:description"]"#,
    r#"meta[name="description"]"#,
    r#"meta[name="twitter:description"]"#,
];
const TITLE_SELECTORS: &[&str] = &[
    r#"meta[property="og:title"]"#,
    r#"meta[name="twitter:title"]"#,
];
const AUTHOR_SELECTORS: &[&str] = &[
    r#"meta[name="author"]"#,
    r#"meta[property="article:author"]"#,
];
const DATE_SELECTORS: &[&str] = &[
    r#"meta[property="article:published_time"]"#,
    r#"meta[name="pubdate"]"#,
    r#"meta[name="date"]"#,
];

/// meta 标签兜底策略
pub struct MetaTagStrategy;

impl ExtractionStrategy for MetaTagStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::MetaTags
    }

    fn attempt(
        &self,
        page: &PageContext<'_>,
        tracker: &mut SelectorTracker,
    ) -> Option<StrategyOutput> {
        let method = self.method();
        let mut description = None;
        for selector in DESCRIPTION_SELECTORS {
            let value = select_attr(page.document, selector, "content");
            tracker.record("body", selector, method, value.as_deref());
            if value.is_some() {
                description = value;
                break;
            }
        }

        Some(StrategyOutput {
            title: page_title(page.document),
            paragraphs: vec![description?],
            author: page_author(page.document),
            published_at: page_published_at(page.document),
        })
    }
}

fn first_content(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors
        .iter()
        .find_map(|selector| select_attr(document, selector, "content"))
}

/// 页面标题：og:title → twitter:title → <title>
pub fn page_title(document: &Html) -> Option<String> {
    first_content(document, TITLE_SELECTORS).or_else(|| {
        let selector = Selector::parse("title").ok()?;
        document
            .select(&selector)
            .map(visible_text)
            .find(|t| !t.is_empty())
    })
}

pub fn page_author(document: &Html) -> Option<String> {
    first_content(document, AUTHOR_SELECTORS)
}

/// 署名前缀，如 "By Jane Doe"、"Par Marie"
static BYLINE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(written\s+by|posted\s+by|by|von|par|por)\s*[:\-]?\s+")
        .expect("Failed to compile byline regex")
});

/// 署名后缀中的站点名或职位，如 "Jane Doe | Wire Staff"
static BYLINE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[|\u{2013}\u{2014}]\s.*$").expect("Failed to compile byline regex"));

/// 清理署名，无法得到有效名字时返回 None
pub fn clean_byline(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let without_prefix = BYLINE_PREFIX.replace(&collapsed, "");
    let name = BYLINE_SUFFIX.replace(&without_prefix, "");
    let name = name.trim().trim_end_matches([',', ';']).trim();
    (!name.is_empty() && name.chars().any(char::is_alphabetic)).then(|| name.to_string())
}

pub fn page_published_at(document: &Html) -> Option<DateTime<Utc>> {
    DATE_SELECTORS
        .iter()
        .filter_map(|selector| select_attr(document, selector, "content"))
        .find_map(|raw| parse_datetime(&raw))
}
