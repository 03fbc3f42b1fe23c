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

use crate::domain::models::job_event::{EventType, JobEvent, Severity};
use crate::domain::repositories::job_event_repository::{JobEventQuery, JobEventRepository};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::infrastructure::database::entities::job_event as event_entity;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;

/// 任务事件仓库实现
pub struct JobEventRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobEventRepositoryImpl {
    /// 创建新的任务事件仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<event_entity::Model> for JobEvent {
    type Error = RepositoryError;

    fn try_from(m: event_entity::Model) -> Result<Self, Self::Error> {
        let severity = m
            .severity
            .parse::<Severity>()
            .map_err(|_| RepositoryError::Corrupted(format!("invalid severity '{}'", m.severity)))?;
        let event_type = m.event_type.parse::<EventType>().map_err(|_| {
            RepositoryError::Corrupted(format!("invalid event type '{}'", m.event_type))
        })?;

        Ok(JobEvent {
            id: m.id,
            job_id: m.job_id,
            source_id: m.source_id,
            severity,
            event_type,
            message: m.message,
            payload: m.payload,
            correlation_id: m.correlation_id,
            sequence: m.sequence,
            created_at: m.created_at.into(),
        })
    }
}

impl From<&JobEvent> for event_entity::ActiveModel {
    fn from(event: &JobEvent) -> Self {
        event_entity::ActiveModel {
            id: Set(event.id),
            job_id: Set(event.job_id),
            source_id: Set(event.source_id),
            severity: Set(event.severity.to_string()),
            event_type: Set(event.event_type.to_string()),
            message: Set(event.message.clone()),
            payload: Set(event.payload.clone()),
            correlation_id: Set(event.correlation_id),
            sequence: Set(event.sequence),
            created_at: Set(event.created_at.into()),
        }
    }
}

#[async_trait]
impl JobEventRepository for JobEventRepositoryImpl {
    async fn append(&self, events: &[JobEvent]) -> Result<(), RepositoryError> {
        if events.is_empty() {
            return Ok(());
        }
        event_entity::Entity::insert_many(events.iter().map(event_entity::ActiveModel::from))
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn query(&self, query: JobEventQuery) -> Result<Vec<JobEvent>, RepositoryError> {
        let mut select =
            event_entity::Entity::find().filter(event_entity::Column::JobId.eq(query.job_id));
        if let Some(source_id) = query.source_id {
            select = select.filter(event_entity::Column::SourceId.eq(source_id));
        }
        if let Some(event_type) = query.event_type {
            select = select.filter(event_entity::Column::EventType.eq(event_type.to_string()));
        }
        if let Some(severity) = query.severity {
            select = select.filter(event_entity::Column::Severity.eq(severity.to_string()));
        }
        if let Some(correlation_id) = query.correlation_id {
            select = select.filter(event_entity::Column::CorrelationId.eq(correlation_id));
        }
        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }

        select
            .order_by_asc(event_entity::Column::CreatedAt)
            .order_by_asc(event_entity::Column::Sequence)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(JobEvent::try_from)
            .collect()
    }
}
