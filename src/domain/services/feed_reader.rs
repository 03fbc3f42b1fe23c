// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;
use std::sync::Arc;

use feed_rs::model::Entry;
use thiserror::Error;
use url::Url;

use crate::domain::models::article::ExtractionCandidate;
use crate::domain::models::source::Source;
use crate::engines::resource_controller::{ResourceController, SourceGate};
use crate::engines::traits::{EngineError, FetchRequest, PageFetcher};
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::url_utils::normalize_candidate_url;

/// Feed 读取错误
#[derive(Error, Debug)]
pub enum FeedError {
    /// 重试后仍无法获取或解析 Feed
    #[error("Feed unavailable: {0}")]
    FeedUnavailable(String),
}

/// Feed 读取器
///
/// 获取并解析源的 RSS/Atom Feed，按 Feed 顺序产出候选，不做排序或打分。
/// 只访问网络，不写存储。
pub struct FeedReader {
    fetcher: Arc<dyn PageFetcher>,
    controller: Arc<ResourceController>,
    retry_policy: RetryPolicy,
}

impl FeedReader {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        controller: Arc<ResourceController>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            fetcher,
            controller,
            retry_policy,
        }
    }

    /// 获取候选，最多 `limit` 个
    pub async fn fetch_candidates(
        &self,
        source: &Source,
        gate: &SourceGate,
        limit: usize,
    ) -> Result<Vec<ExtractionCandidate>, FeedError> {
        let base = Url::parse(&source.feed_url)
            .map_err(|e| FeedError::FeedUnavailable(format!("invalid feed url: {}", e)))?;
        let request = FetchRequest::new(
            source.feed_url.clone(),
            source.policy.user_agent.clone(),
            source.policy.timeout(),
        )
        .for_source(source.id);

        let body = self
            .retry_policy
            .run(
                |attempt| {
                    let request = &request;
                    async move {
                        tracing::debug!(feed_url = %request.url, attempt, "Fetching feed");
                        let response = self
                            .controller
                            .fetch(self.fetcher.as_ref(), gate, request)
                            .await?
                            .ensure_success()?;
                        Ok::<_, EngineError>(response.content)
                    }
                },
                EngineError::is_retryable,
            )
            .await
            .map_err(|e| FeedError::FeedUnavailable(e.to_string()))?;

        parse_candidates(body.as_bytes(), &base, limit)
    }
}

/// 解析 Feed 文档为候选列表
///
/// 相对链接按 Feed 地址解析，同一 Feed 内重复的链接只保留第一次出现。
pub fn parse_candidates(
    bytes: &[u8],
    base: &Url,
    limit: usize,
) -> Result<Vec<ExtractionCandidate>, FeedError> {
    let feed = feed_rs::parser::parse(bytes)
        .map_err(|e| FeedError::FeedUnavailable(format!("feed parse error: {}", e)))?;

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for entry in feed.entries {
        if candidates.len() >= limit {
            break;
        }
        let Some(url) = entry_link(&entry).and_then(|link| normalize_candidate_url(base, &link))
        else {
            tracing::debug!(entry_id = %entry.id, "Feed entry without usable link, skipping");
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let position = candidates.len();
        candidates.push(ExtractionCandidate {
            url,
            title: entry.title.map(|t| t.content.trim().to_string()).filter(|t| !t.is_empty()),
            author: entry.authors.first().map(|a| a.name.clone()),
            published_at: entry.published.or(entry.updated),
            summary: entry.summary.map(|s| s.content),
            position,
        });
    }

    Ok(candidates)
}

/// 优先使用 alternate 链接，其次任意链接，最后是形如 URL 的 id
fn entry_link(entry: &Entry) -> Option<String> {
    let alternate = entry.links.iter().find(|l| {
        !l.href.trim().is_empty()
            && l
                .rel
                .as_deref()
                .map_or(true, |rel| rel.is_empty() || rel.eq_ignore_ascii_case("alternate"))
    });
    if let Some(link) = alternate.or_else(|| entry.links.iter().find(|l| !l.href.trim().is_empty())) {
        return Some(link.href.trim().to_string());
    }
    let id = entry.id.trim();
    (id.starts_with("http://") || id.starts_with("https://")).then(|| id.to_string())
}
