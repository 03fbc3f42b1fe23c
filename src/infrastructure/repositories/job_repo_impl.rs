// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::job::{JobStatus, ScrapingJob};
use crate::domain::repositories::job_repository::{JobQueryParams, JobRepository, RepositoryError};
use crate::infrastructure::database::entities::scraping_job as job_entity;
use async_trait::async_trait;
use sea_orm::*;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

const TERMINAL_STATUSES: [JobStatus; 4] = [
    JobStatus::Successful,
    JobStatus::Partial,
    JobStatus::Failed,
    JobStatus::Cancelled,
];

/// 抓取任务仓库实现
pub struct JobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobRepositoryImpl {
    /// 创建新的任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<job_entity::Model> for ScrapingJob {
    type Error = RepositoryError;

    fn try_from(m: job_entity::Model) -> Result<Self, Self::Error> {
        let status = m
            .status
            .parse::<JobStatus>()
            .map_err(|_| RepositoryError::Corrupted(format!("invalid job status '{}'", m.status)))?;
        let source_ids: Vec<Uuid> = serde_json::from_value(m.source_ids)
            .map_err(|e| RepositoryError::Corrupted(format!("invalid source_ids: {}", e)))?;

        Ok(ScrapingJob {
            id: m.id,
            status,
            source_ids,
            articles_per_source: m.articles_per_source.max(0) as u32,
            enable_tracking: m.enable_tracking,
            total_extracted: m.total_extracted.max(0) as u32,
            total_saved: m.total_saved.max(0) as u32,
            total_duplicates: m.total_duplicates.max(0) as u32,
            total_errors: m.total_errors.max(0) as u32,
            error_message: m.error_message,
            triggered_at: m.triggered_at.into(),
            started_at: m.started_at.map(Into::into),
            completed_at: m.completed_at.map(Into::into),
        })
    }
}

fn to_active_model(job: &ScrapingJob) -> job_entity::ActiveModel {
    job_entity::ActiveModel {
        id: Set(job.id),
        status: Set(job.status.to_string()),
        source_ids: Set(json!(job.source_ids)),
        articles_per_source: Set(job.articles_per_source as i32),
        enable_tracking: Set(job.enable_tracking),
        total_extracted: Set(job.total_extracted as i32),
        total_saved: Set(job.total_saved as i32),
        total_duplicates: Set(job.total_duplicates as i32),
        total_errors: Set(job.total_errors as i32),
        error_message: Set(job.error_message.clone()),
        triggered_at: Set(job.triggered_at.into()),
        started_at: Set(job.started_at.map(Into::into)),
        completed_at: Set(job.completed_at.map(Into::into)),
    }
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn create(&self, job: &ScrapingJob) -> Result<ScrapingJob, RepositoryError> {
        to_active_model(job).insert(self.db.as_ref()).await?;
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapingJob>, RepositoryError> {
        job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(ScrapingJob::try_from)
            .transpose()
    }

    async fn update(&self, job: &ScrapingJob) -> Result<ScrapingJob, RepositoryError> {
        let mut model = to_active_model(job);
        model.id = NotSet;
        model.triggered_at = NotSet;

        // 终态记录不可再修改
        let result = job_entity::Entity::update_many()
            .set(model)
            .filter(job_entity::Column::Id.eq(job.id))
            .filter(
                job_entity::Column::Status
                    .is_not_in(TERMINAL_STATUSES.iter().map(|s| s.to_string())),
            )
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return match self.find_by_id(job.id).await? {
                Some(existing) => Err(RepositoryError::Conflict(format!(
                    "job {} is already {}",
                    job.id, existing.status
                ))),
                None => Err(RepositoryError::NotFound),
            };
        }

        Ok(job.clone())
    }

    async fn list(
        &self,
        params: JobQueryParams,
    ) -> Result<(Vec<ScrapingJob>, u64), RepositoryError> {
        let mut query = job_entity::Entity::find();
        if let Some(status) = params.status {
            query = query.filter(job_entity::Column::Status.eq(status.to_string()));
        }

        let total = query.clone().count(self.db.as_ref()).await?;
        let models = query
            .order_by_desc(job_entity::Column::TriggeredAt)
            .limit(params.limit)
            .offset(params.offset)
            .all(self.db.as_ref())
            .await?;

        let jobs = models
            .into_iter()
            .map(ScrapingJob::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((jobs, total))
    }
}
