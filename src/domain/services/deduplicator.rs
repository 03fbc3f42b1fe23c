// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::domain::repositories::content_repository::{ContentRepository, DuplicateKind};
use crate::domain::repositories::job_repository::RepositoryError;

/// 规范化正文：小写并折叠空白
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 内容指纹：规范化正文的 SHA-256（十六进制）
///
/// 对同一正文始终稳定，重复抓取因此是幂等的。
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(text).as_bytes());
    hex::encode(hasher.finalize())
}

/// 去重器
///
/// URL 检查先于内容指纹检查：URL 冲突代价更低，语义也不同
/// （同一 URL 重复抓取 vs. 不同 URL 的相同内容）。
#[derive(Clone)]
pub struct Deduplicator {
    content_repo: Arc<dyn ContentRepository>,
}

impl Deduplicator {
    pub fn new(content_repo: Arc<dyn ContentRepository>) -> Self {
        Self { content_repo }
    }

    /// URL 是否已入库，可在抓取页面前调用
    pub async fn is_known_url(&self, url: &str) -> Result<bool, RepositoryError> {
        self.content_repo.exists_by_url(url).await
    }

    /// 内容指纹是否已入库
    pub async fn is_duplicate(&self, fingerprint: &str) -> Result<bool, RepositoryError> {
        self.content_repo.exists_by_hash(fingerprint).await
    }

    /// 依次检查 URL 与指纹
    pub async fn check(
        &self,
        url: &str,
        fingerprint: &str,
    ) -> Result<Option<DuplicateKind>, RepositoryError> {
        if self.is_known_url(url).await? {
            return Ok(Some(DuplicateKind::Url));
        }
        if self.is_duplicate(fingerprint).await? {
            return Ok(Some(DuplicateKind::ContentHash));
        }
        Ok(None)
    }
}
