// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 段落分隔符，保留正文的段落结构
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// 抽取候选
///
/// Feed 中的一条文章引用，只在一次任务内存在，不落库。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionCandidate {
    /// 文章地址（已规范化）
    pub url: String,
    /// Feed 中给出的标题
    pub title: Option<String>,
    /// Feed 中给出的作者
    pub author: Option<String>,
    /// Feed 中给出的发布时间
    pub published_at: Option<DateTime<Utc>>,
    /// Feed 中给出的摘要
    pub summary: Option<String>,
    /// 在 Feed 中的位置（从 0 开始）
    pub position: usize,
}

impl ExtractionCandidate {
    pub fn new(url: impl Into<String>, position: usize) -> Self {
        Self {
            url: url.into(),
            title: None,
            author: None,
            published_at: None,
            summary: None,
            position,
        }
    }
}

/// 抽取策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// 页面内嵌的结构化数据（JSON-LD NewsArticle 等）
    StructuredData,
    /// 选择器级联
    SelectorCascade,
    /// 页面级 meta 标签兜底
    MetaTags,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExtractionMethod::StructuredData => write!(f, "structured_data"),
            ExtractionMethod::SelectorCascade => write!(f, "selector_cascade"),
            ExtractionMethod::MetaTags => write!(f, "meta_tags"),
        }
    }
}

impl FromStr for ExtractionMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "structured_data" => Ok(ExtractionMethod::StructuredData),
            "selector_cascade" => Ok(ExtractionMethod::SelectorCascade),
            "meta_tags" => Ok(ExtractionMethod::MetaTags),
            _ => Err(()),
        }
    }
}

/// 选择器轨迹
///
/// 开启追踪模式时，每一次选择器尝试（无论成功与否）都会记录一条。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorTrace {
    /// 目标字段（title/body/author/published_at 等）
    pub field: String,
    /// 使用的选择器或键路径
    pub selector: String,
    /// 所属策略
    pub method: ExtractionMethod,
    /// 命中的值，未命中为 None
    pub value: Option<String>,
}

/// 抽取出的文章，仅存在于一次抽取到持久化的周期内
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedArticle {
    pub url: String,
    pub title: String,
    /// 以段落分隔符连接的正文
    pub body: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub language: Option<String>,
    /// 规范化正文的稳定哈希
    pub fingerprint: String,
    /// 质量分（0-100），仅用于监控
    pub quality_score: u8,
    pub method: ExtractionMethod,
    /// 选择器轨迹，只有追踪模式下才存在
    pub traces: Option<Vec<SelectorTrace>>,
}

impl ExtractedArticle {
    /// 正文段落
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.body
            .split(PARAGRAPH_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// 内容处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Processed,
    Archived,
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProcessingStatus::Pending => write!(f, "pending"),
            ProcessingStatus::Processed => write!(f, "processed"),
            ProcessingStatus::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for ProcessingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProcessingStatus::Pending),
            "processed" => Ok(ProcessingStatus::Processed),
            "archived" => Ok(ProcessingStatus::Archived),
            _ => Err(()),
        }
    }
}

/// 持久化后的内容记录
///
/// 插入后除归档时的状态变更外不再修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedContentRecord {
    pub id: Uuid,
    pub source_id: Uuid,
    pub job_id: Option<Uuid>,
    pub source_url: String,
    pub title: String,
    pub body: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub language: Option<String>,
    pub content_hash: String,
    pub quality_score: u8,
    pub extraction_method: ExtractionMethod,
    pub processing_status: ProcessingStatus,
    /// gzip 压缩后的正文
    #[serde(skip_serializing)]
    pub compressed_payload: Option<Vec<u8>>,
    pub selector_traces: Option<Vec<SelectorTrace>>,
    pub created_at: DateTime<Utc>,
}

impl ScrapedContentRecord {
    /// 从抽取结果构建待插入记录
    pub fn from_article(
        article: &ExtractedArticle,
        source_id: Uuid,
        job_id: Option<Uuid>,
        compressed_payload: Option<Vec<u8>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id,
            job_id,
            source_url: article.url.clone(),
            title: article.title.clone(),
            body: article.body.clone(),
            author: article.author.clone(),
            published_at: article.published_at,
            language: article.language.clone(),
            content_hash: article.fingerprint.clone(),
            quality_score: article.quality_score,
            extraction_method: article.method,
            processing_status: ProcessingStatus::Pending,
            compressed_payload,
            selector_traces: article.traces.clone(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> ExtractedArticle {
        ExtractedArticle {
            url: "https://example.com/a".to_string(),
            title: "Title".to_string(),
            body: "First.\n\n  \n\nSecond.".to_string(),
            author: Some("Jane".to_string()),
            published_at: None,
            language: Some("en".to_string()),
            fingerprint: "abc".to_string(),
            quality_score: 42,
            method: ExtractionMethod::SelectorCascade,
            traces: None,
        }
    }

    #[test]
    fn test_paragraphs_skip_blank_blocks() {
        let paragraphs: Vec<_> = article().paragraphs().map(str::to_string).collect();
        assert_eq!(paragraphs, vec!["First.", "Second."]);
    }

    #[test]
    fn test_record_from_article() {
        let source_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();
        let record = ScrapedContentRecord::from_article(&article(), source_id, Some(job_id), None);

        assert_eq!(record.source_id, source_id);
        assert_eq!(record.job_id, Some(job_id));
        assert_eq!(record.content_hash, "abc");
        assert_eq!(record.processing_status, ProcessingStatus::Pending);
        assert_eq!(record.extraction_method, ExtractionMethod::SelectorCascade);
    }

    #[test]
    fn test_method_and_status_strings() {
        assert_eq!(
            "meta_tags".parse::<ExtractionMethod>(),
            Ok(ExtractionMethod::MetaTags)
        );
        assert_eq!(ExtractionMethod::StructuredData.to_string(), "structured_data");
        assert_eq!("archived".parse::<ProcessingStatus>(), Ok(ProcessingStatus::Archived));
        assert!("unknown".parse::<ProcessingStatus>().is_err());
    }
}
