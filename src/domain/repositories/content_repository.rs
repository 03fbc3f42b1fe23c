// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::job_repository::RepositoryError;
use crate::domain::models::article::{ProcessingStatus, ScrapedContentRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 重复类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKind {
    /// 同一 URL 被再次抓取
    Url,
    /// 不同 URL 但内容指纹相同
    ContentHash,
}

/// 唯一插入的结果
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Inserted(ScrapedContentRecord),
    Duplicate(DuplicateKind),
}

/// 内容查询条件
#[derive(Debug, Clone, Default)]
pub struct ContentQuery {
    pub source_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub language: Option<String>,
    pub processing_status: Option<ProcessingStatus>,
    /// 标题或正文的子串搜索
    pub text: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

/// 内容仓库特质
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// 在单篇文章的事务内插入记录
    ///
    /// 事务内先检查 URL 再检查内容指纹；违反唯一约束同样归为重复。
    async fn insert_unique(
        &self,
        record: &ScrapedContentRecord,
    ) -> Result<InsertOutcome, RepositoryError>;
    /// 检查URL是否存在
    async fn exists_by_url(&self, url: &str) -> Result<bool, RepositoryError>;
    /// 检查内容指纹是否存在
    async fn exists_by_hash(&self, content_hash: &str) -> Result<bool, RepositoryError>;
    /// 根据ID查找内容
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapedContentRecord>, RepositoryError>;
    /// 条件查询，返回当前页与总数
    async fn query(
        &self,
        query: ContentQuery,
    ) -> Result<(Vec<ScrapedContentRecord>, u64), RepositoryError>;
    /// 归档流程使用的状态变更
    async fn update_processing_status(
        &self,
        id: Uuid,
        status: ProcessingStatus,
    ) -> Result<(), RepositoryError>;
}
