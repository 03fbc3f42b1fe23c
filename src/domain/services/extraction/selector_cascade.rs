// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;

use scraper::{ElementRef, Selector};

use super::filters::is_structural_promo;
use super::{
    parse_datetime, select_attr, visible_text, ExtractionStrategy, PageContext, SelectorTracker,
    StrategyOutput,
};
use crate::domain::models::article::{ExtractionMethod, PARAGRAPH_SEPARATOR};

/// 通用正文选择器，按优先级排列
pub const GENERIC_BODY_SELECTORS: &[&str] = &[
    r#"[itemprop="articleBody"]"#,
    ".article-body",
    ".article-content",
    ".story-body",
    ".entry-content",
    ".post-content",
    "article",
    "main",
];

const TITLE_SELECTORS: &[&str] = &["article h1", "h1"];
const AUTHOR_SELECTORS: &[&str] = &[
    r#"[rel="author"]"#,
    r#"[itemprop="author"]"#,
    ".byline",
    ".author",
];
const DATE_SELECTOR: &str = "time[datetime]";

/// 选择器级联策略
///
/// 先尝试源专属选择器，再尝试通用选择器。一个选择器匹配多个元素时，
/// 按文档顺序抽取并拼接全部元素，而不只是第一个。
pub struct SelectorCascadeStrategy {
    generic: Vec<String>,
}

impl Default for SelectorCascadeStrategy {
    fn default() -> Self {
        Self {
            generic: GENERIC_BODY_SELECTORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SelectorCascadeStrategy {
    pub fn with_generic(generic: Vec<String>) -> Self {
        Self { generic }
    }

    /// 一个选择器对应的全部段落
    fn paragraphs_for(&self, page: &PageContext<'_>, selector: &Selector) -> Vec<String> {
        let Ok(paragraph_selector) = Selector::parse("p") else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut paragraphs = Vec::new();
        for element in page.document.select(selector) {
            // 嵌套匹配只取最外层，避免重复
            if element.ancestors().any(|a| seen.contains(&a.id())) {
                continue;
            }
            seen.insert(element.id());
            collect_paragraphs(element, &paragraph_selector, page.promo_min_length, &mut paragraphs);
        }
        paragraphs
    }
}

/// 匹配元素内的 `<p>` 逐段过滤；元素本身是段落或没有 `<p>` 子孙时，整个元素视作一段
fn collect_paragraphs(
    element: ElementRef<'_>,
    paragraph_selector: &Selector,
    promo_min_length: usize,
    out: &mut Vec<String>,
) {
    let mut found_paragraph = false;
    if !element.value().name().eq_ignore_ascii_case("p") {
        for p in element.select(paragraph_selector) {
            found_paragraph = true;
            push_paragraph(p, promo_min_length, out);
        }
    }

    if !found_paragraph {
        push_paragraph(element, promo_min_length, out);
    }
}

fn push_paragraph(paragraph: ElementRef<'_>, promo_min_length: usize, out: &mut Vec<String>) {
    if is_structural_promo(paragraph, promo_min_length) {
        tracing::trace!("Dropping structural promo paragraph");
        return;
    }
    let text = visible_text(paragraph);
    if !text.is_empty() {
        out.push(text);
    }
}

impl ExtractionStrategy for SelectorCascadeStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::SelectorCascade
    }

    fn attempt(
        &self,
        page: &PageContext<'_>,
        tracker: &mut SelectorTracker,
    ) -> Option<StrategyOutput> {
        let method = self.method();
        let mut best: Option<Vec<String>> = None;
        let mut best_length = 0;

        let patterns = page
            .source_selectors
            .iter()
            .chain(self.generic.iter());

        for pattern in patterns {
            let Ok(selector) = Selector::parse(pattern) else {
                tracing::warn!(selector = %pattern, "Invalid content selector, skipping");
                tracker.record("body", pattern, method, None);
                continue;
            };

            let paragraphs = self.paragraphs_for(page, &selector);
            let length: usize = paragraphs.iter().map(|p| p.chars().count()).sum();
            if tracker.is_enabled() {
                let joined = paragraphs.join(PARAGRAPH_SEPARATOR);
                tracker.record("body", pattern, method, (!joined.is_empty()).then_some(joined.as_str()));
            }

            if length >= page.min_length.max(1) {
                best = Some(paragraphs);
                break;
            }
            if length > best_length {
                best_length = length;
                best = Some(paragraphs);
            }
        }

        let paragraphs = best?;
        Some(StrategyOutput {
            title: first_text(page, TITLE_SELECTORS, "title", tracker),
            paragraphs,
            author: first_text(page, AUTHOR_SELECTORS, "author", tracker),
            published_at: {
                let raw = select_attr(page.document, DATE_SELECTOR, "datetime");
                tracker.record("published_at", DATE_SELECTOR, method, raw.as_deref());
                raw.as_deref().and_then(parse_datetime)
            },
        })
    }
}

/// 按顺序尝试选择器，返回第一个非空文本
fn first_text(
    page: &PageContext<'_>,
    selectors: &[&str],
    field: &str,
    tracker: &mut SelectorTracker,
) -> Option<String> {
    for pattern in selectors {
        let Ok(selector) = Selector::parse(pattern) else {
            continue;
        };
        let value = page
            .document
            .select(&selector)
            .map(visible_text)
            .find(|t| !t.is_empty());
        tracker.record(field, pattern, ExtractionMethod::SelectorCascade, value.as_deref());
        if value.is_some() {
            return value;
        }
    }
    None
}
