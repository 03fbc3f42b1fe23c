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

use crate::domain::models::source::{PolitenessPolicy, Source};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::source_repository::SourceRepository;
use crate::infrastructure::database::entities::source as source_entity;
use async_trait::async_trait;
use sea_orm::*;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// 内容源仓库实现
pub struct SourceRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl SourceRepositoryImpl {
    /// 创建新的内容源仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 写入内容源
    ///
    /// 仅供源管理工具与测试数据准备使用，引擎本身从不修改源。
    pub async fn insert(&self, source: &Source) -> Result<Source, RepositoryError> {
        source_entity::ActiveModel {
            id: Set(source.id),
            name: Set(source.name.clone()),
            domain: Set(source.domain.clone()),
            feed_url: Set(source.feed_url.clone()),
            respect_robots: Set(source.policy.respect_robots),
            delay_ms: Set(source.policy.delay_ms as i64),
            user_agent: Set(source.policy.user_agent.clone()),
            timeout_ms: Set(source.policy.timeout_ms as i64),
            content_selectors: Set(json!(source.content_selectors)),
            is_active: Set(source.is_active),
            created_at: Set(source.created_at.into()),
            updated_at: Set(source.updated_at.into()),
        }
        .insert(self.db.as_ref())
        .await?;
        Ok(source.clone())
    }
}

impl From<source_entity::Model> for Source {
    fn from(m: source_entity::Model) -> Self {
        // 选择器列表格式异常时退回到通用选择器
        let content_selectors = serde_json::from_value(m.content_selectors).unwrap_or_default();
        Source {
            id: m.id,
            name: m.name,
            domain: m.domain,
            feed_url: m.feed_url,
            policy: PolitenessPolicy {
                respect_robots: m.respect_robots,
                delay_ms: m.delay_ms.max(0) as u64,
                user_agent: m.user_agent,
                timeout_ms: m.timeout_ms.max(0) as u64,
            },
            content_selectors,
            is_active: m.is_active,
            created_at: m.created_at.into(),
            updated_at: m.updated_at.into(),
        }
    }
}

#[async_trait]
impl SourceRepository for SourceRepositoryImpl {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Source>, RepositoryError> {
        Ok(source_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(Source::from))
    }

    async fn find_active(&self) -> Result<Vec<Source>, RepositoryError> {
        Ok(source_entity::Entity::find()
            .filter(source_entity::Column::IsActive.eq(true))
            .order_by_asc(source_entity::Column::Name)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Source::from)
            .collect())
    }
}
