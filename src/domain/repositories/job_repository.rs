// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{JobStatus, ScrapingJob};
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 并发修改冲突或违反不可变约束
    #[error("Conflict: {0}")]
    Conflict(String),
    /// 存储数据无法还原为领域对象
    #[error("Corrupted record: {0}")]
    Corrupted(String),
}

/// 任务列表查询参数
#[derive(Debug, Clone, Default)]
pub struct JobQueryParams {
    pub status: Option<JobStatus>,
    pub limit: u64,
    pub offset: u64,
}

/// 抓取任务仓库特质
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, job: &ScrapingJob) -> Result<ScrapingJob, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapingJob>, RepositoryError>;
    /// 更新任务
    ///
    /// 已处于终态的任务不可再更新，返回 `Conflict`。
    async fn update(&self, job: &ScrapingJob) -> Result<ScrapingJob, RepositoryError>;
    /// 按触发时间倒序列出任务
    async fn list(&self, params: JobQueryParams)
        -> Result<(Vec<ScrapingJob>, u64), RepositoryError>;
}
