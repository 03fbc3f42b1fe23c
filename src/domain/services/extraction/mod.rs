// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 内容抽取
//!
//! 按固定顺序尝试多个抽取策略，第一个产出内容达到长度阈值的策略胜出：
//! 结构化数据 → 选择器级联 → meta 标签兜底。策略顺序是确定的，不存在竞争。

pub mod filters;
pub mod language;
pub mod meta_tags;
pub mod quality;
pub mod selector_cascade;
pub mod structured_data;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::models::article::{
    ExtractedArticle, ExtractionCandidate, ExtractionMethod, SelectorTrace, PARAGRAPH_SEPARATOR,
};
use crate::domain::services::deduplicator;

pub use meta_tags::MetaTagStrategy;
pub use quality::QualityWeights;
pub use selector_cascade::SelectorCascadeStrategy;
pub use structured_data::StructuredDataStrategy;

/// 抽取参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// 结构化数据与选择器策略的最小正文长度（字符）
    pub min_content_length: usize,
    /// meta 标签兜底的最小长度
    pub fallback_min_length: usize,
    /// 推广段落的最小长度，未超过该长度的链接段落保留
    pub promo_min_length: usize,
    pub quality: QualityWeights,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_content_length: 200,
            fallback_min_length: 40,
            promo_min_length: 10,
            quality: QualityWeights::default(),
        }
    }
}

/// 策略产出的原始内容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyOutput {
    pub title: Option<String>,
    pub paragraphs: Vec<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl StrategyOutput {
    pub fn body(&self) -> String {
        self.paragraphs.join(PARAGRAPH_SEPARATOR)
    }

    pub fn content_length(&self) -> usize {
        self.paragraphs.iter().map(|p| p.chars().count()).sum()
    }
}

/// 单个页面的抽取上下文
pub struct PageContext<'a> {
    pub url: &'a str,
    pub document: &'a Html,
    /// 源专属选择器，先于通用选择器尝试
    pub source_selectors: &'a [String],
    /// 当前策略需要达到的长度阈值
    pub min_length: usize,
    pub promo_min_length: usize,
}

/// 选择器轨迹记录器
///
/// 关闭时 `record` 直接返回，不做任何分配。
#[derive(Debug, Default)]
pub struct SelectorTracker {
    enabled: bool,
    traces: Vec<SelectorTrace>,
}

impl SelectorTracker {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            traces: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(
        &mut self,
        field: &str,
        selector: &str,
        method: ExtractionMethod,
        value: Option<&str>,
    ) {
        if !self.enabled {
            return;
        }
        self.traces.push(SelectorTrace {
            field: field.to_string(),
            selector: selector.to_string(),
            method,
            value: value.map(str::to_string),
        });
    }

    pub fn into_traces(self) -> Option<Vec<SelectorTrace>> {
        self.enabled.then_some(self.traces)
    }
}

/// 抽取策略
pub trait ExtractionStrategy: Send + Sync {
    fn method(&self) -> ExtractionMethod;

    /// 没有可用内容时返回 None
    fn attempt(&self, page: &PageContext<'_>, tracker: &mut SelectorTracker)
        -> Option<StrategyOutput>;
}

/// 抽取失败原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum FailureReason {
    /// 所有策略都未达到长度阈值
    BelowThreshold,
    /// 页面请求超时
    Timeout,
    /// 页面返回非成功状态码
    HttpStatus(u16),
    /// 其他网络错误
    Fetch(String),
    /// robots.txt 不允许抓取
    RobotsDisallowed,
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::BelowThreshold => "below_threshold",
            FailureReason::Timeout => "timeout",
            FailureReason::HttpStatus(_) => "http_status",
            FailureReason::Fetch(_) => "fetch_error",
            FailureReason::RobotsDisallowed => "robots_disallowed",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FailureReason::BelowThreshold => write!(f, "no strategy reached the content threshold"),
            FailureReason::Timeout => write!(f, "request timed out"),
            FailureReason::HttpStatus(status) => write!(f, "unexpected HTTP status {}", status),
            FailureReason::Fetch(e) => write!(f, "fetch failed: {}", e),
            FailureReason::RobotsDisallowed => write!(f, "disallowed by robots.txt"),
        }
    }
}

/// 抽取失败
///
/// 这是正常且常见的结果，不是异常。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub url: String,
    pub reason: FailureReason,
    /// 各策略中最长的正文长度
    pub best_length: usize,
    pub traces: Option<Vec<SelectorTrace>>,
}

impl ExtractionFailure {
    pub fn new(url: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            url: url.into(),
            reason,
            best_length: 0,
            traces: None,
        }
    }
}

/// 内容抽取器
pub struct ContentExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    config: ExtractionConfig,
}

impl ContentExtractor {
    /// 使用默认策略顺序创建
    pub fn new(config: ExtractionConfig) -> Self {
        Self::with_strategies(
            config,
            vec![
                Box::new(StructuredDataStrategy),
                Box::new(SelectorCascadeStrategy::default()),
                Box::new(MetaTagStrategy),
            ],
        )
    }

    pub fn with_strategies(
        config: ExtractionConfig,
        strategies: Vec<Box<dyn ExtractionStrategy>>,
    ) -> Self {
        Self { strategies, config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// 从已获取的 HTML 中抽取文章
    ///
    /// 纯 CPU 计算，不含挂起点。
    pub fn extract(
        &self,
        candidate: &ExtractionCandidate,
        html: &str,
        source_selectors: &[String],
        tracking: bool,
    ) -> Result<ExtractedArticle, ExtractionFailure> {
        let document = Html::parse_document(html);
        let mut tracker = SelectorTracker::new(tracking);
        let mut best_length = 0;

        for strategy in &self.strategies {
            let method = strategy.method();
            let min_length = match method {
                ExtractionMethod::MetaTags => self.config.fallback_min_length,
                _ => self.config.min_content_length,
            };
            let page = PageContext {
                url: &candidate.url,
                document: &document,
                source_selectors,
                min_length,
                promo_min_length: self.config.promo_min_length,
            };

            let Some(output) = strategy.attempt(&page, &mut tracker) else {
                continue;
            };
            let length = output.content_length();
            best_length = best_length.max(length);
            if length < min_length.max(1) {
                tracing::debug!(
                    url = %candidate.url,
                    method = %method,
                    length,
                    min_length,
                    "Strategy output below threshold, falling through"
                );
                continue;
            }

            return Ok(self.assemble(candidate, &document, output, method, tracker));
        }

        Err(ExtractionFailure {
            url: candidate.url.clone(),
            reason: FailureReason::BelowThreshold,
            best_length,
            traces: tracker.into_traces(),
        })
    }

    /// 补全元数据并计算指纹、语言与质量分
    fn assemble(
        &self,
        candidate: &ExtractionCandidate,
        document: &Html,
        output: StrategyOutput,
        method: ExtractionMethod,
        tracker: SelectorTracker,
    ) -> ExtractedArticle {
        let body = output.body();
        let title = output
            .title
            .clone()
            .or_else(|| meta_tags::page_title(document))
            .or_else(|| candidate.title.clone())
            .unwrap_or_default();
        let author = output
            .author
            .clone()
            .or_else(|| meta_tags::page_author(document))
            .or_else(|| candidate.author.clone())
            .and_then(|raw| meta_tags::clean_byline(&raw));
        let published_at = output
            .published_at
            .or_else(|| meta_tags::page_published_at(document))
            .or(candidate.published_at);
        let language = language::detect(language::html_lang(document).as_deref(), &body);
        let quality_score = quality::score(
            &self.config.quality,
            output.content_length(),
            output.paragraphs.len(),
            author.is_some(),
            published_at.is_some(),
        );

        ExtractedArticle {
            url: candidate.url.clone(),
            title,
            fingerprint: deduplicator::fingerprint(&body),
            body,
            author,
            published_at,
            language,
            quality_score,
            method,
            traces: tracker.into_traces(),
        }
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

/// 将连续空白折叠为单个空格
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 元素的可见文本，跳过 script/style/noscript
pub(crate) fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript"))
        });
        if !hidden {
            out.push_str(text);
        }
    }
    collapse_whitespace(&out)
}

/// 第一个匹配元素的属性值
pub(crate) fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|e| e.value().attr(attr))
        .map(collapse_whitespace)
        .find(|v| !v.is_empty())
}

/// 解析常见的日期格式
pub(crate) fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[path = "extraction_test.rs"]
mod tests;
