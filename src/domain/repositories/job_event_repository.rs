// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::job_repository::RepositoryError;
use crate::domain::models::job_event::{EventType, JobEvent, Severity};
use async_trait::async_trait;
use uuid::Uuid;

/// 任务事件查询条件
#[derive(Debug, Clone, Default)]
pub struct JobEventQuery {
    pub job_id: Uuid,
    pub source_id: Option<Uuid>,
    pub event_type: Option<EventType>,
    pub severity: Option<Severity>,
    pub correlation_id: Option<Uuid>,
    /// 为 None 时返回全部
    pub limit: Option<u64>,
}

impl JobEventQuery {
    pub fn for_job(job_id: Uuid) -> Self {
        Self {
            job_id,
            ..Default::default()
        }
    }
}

/// 任务事件仓库特质
///
/// 只追加，不更新不删除。
#[async_trait]
pub trait JobEventRepository: Send + Sync {
    /// 追加一批事件
    async fn append(&self, events: &[JobEvent]) -> Result<(), RepositoryError>;
    /// 按 (created_at, sequence) 升序查询
    async fn query(&self, query: JobEventQuery) -> Result<Vec<JobEvent>, RepositoryError>;
}
