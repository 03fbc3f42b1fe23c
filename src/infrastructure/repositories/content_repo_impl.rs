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

use crate::domain::models::article::{
    ExtractionMethod, ProcessingStatus, ScrapedContentRecord, SelectorTrace,
};
use crate::domain::repositories::content_repository::{
    ContentQuery, ContentRepository, DuplicateKind, InsertOutcome,
};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::infrastructure::database::entities::scraped_content as content_entity;
use async_trait::async_trait;
use sea_orm::{sea_query::Expr, *};
use std::sync::Arc;
use uuid::Uuid;

/// 内容仓库实现
pub struct ContentRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ContentRepositoryImpl {
    /// 创建新的内容仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<content_entity::Model> for ScrapedContentRecord {
    type Error = RepositoryError;

    fn try_from(m: content_entity::Model) -> Result<Self, Self::Error> {
        let extraction_method = m.extraction_method.parse::<ExtractionMethod>().map_err(|_| {
            RepositoryError::Corrupted(format!("invalid extraction method '{}'", m.extraction_method))
        })?;
        let processing_status = m.processing_status.parse::<ProcessingStatus>().map_err(|_| {
            RepositoryError::Corrupted(format!("invalid processing status '{}'", m.processing_status))
        })?;
        let selector_traces = m
            .selector_traces
            .map(serde_json::from_value::<Vec<SelectorTrace>>)
            .transpose()
            .map_err(|e| RepositoryError::Corrupted(format!("invalid selector traces: {}", e)))?;

        Ok(ScrapedContentRecord {
            id: m.id,
            source_id: m.source_id,
            job_id: m.job_id,
            source_url: m.source_url,
            title: m.title,
            body: m.body,
            author: m.author,
            published_at: m.published_at.map(Into::into),
            language: m.language,
            content_hash: m.content_hash,
            quality_score: m.quality_score.clamp(0, 100) as u8,
            extraction_method,
            processing_status,
            compressed_payload: m.compressed_payload,
            selector_traces,
            created_at: m.created_at.into(),
        })
    }
}

fn to_active_model(record: &ScrapedContentRecord) -> content_entity::ActiveModel {
    content_entity::ActiveModel {
        id: Set(record.id),
        source_id: Set(record.source_id),
        job_id: Set(record.job_id),
        source_url: Set(record.source_url.clone()),
        title: Set(record.title.clone()),
        body: Set(record.body.clone()),
        author: Set(record.author.clone()),
        published_at: Set(record.published_at.map(Into::into)),
        language: Set(record.language.clone()),
        content_hash: Set(record.content_hash.clone()),
        quality_score: Set(record.quality_score as i32),
        extraction_method: Set(record.extraction_method.to_string()),
        processing_status: Set(record.processing_status.to_string()),
        compressed_payload: Set(record.compressed_payload.clone()),
        selector_traces: Set(record
            .selector_traces
            .as_ref()
            .map(|traces| serde_json::json!(traces))),
        created_at: Set(record.created_at.into()),
    }
}

/// 从唯一约束错误信息判断冲突列
fn duplicate_kind_from(message: &str) -> DuplicateKind {
    if message.contains("content_hash") {
        DuplicateKind::ContentHash
    } else {
        DuplicateKind::Url
    }
}

#[async_trait]
impl ContentRepository for ContentRepositoryImpl {
    async fn insert_unique(
        &self,
        record: &ScrapedContentRecord,
    ) -> Result<InsertOutcome, RepositoryError> {
        let txn = self.db.begin().await?;

        let url_taken = content_entity::Entity::find()
            .filter(content_entity::Column::SourceUrl.eq(record.source_url.as_str()))
            .count(&txn)
            .await?
            > 0;
        if url_taken {
            txn.rollback().await?;
            return Ok(InsertOutcome::Duplicate(DuplicateKind::Url));
        }

        let hash_taken = content_entity::Entity::find()
            .filter(content_entity::Column::ContentHash.eq(record.content_hash.as_str()))
            .count(&txn)
            .await?
            > 0;
        if hash_taken {
            txn.rollback().await?;
            return Ok(InsertOutcome::Duplicate(DuplicateKind::ContentHash));
        }

        match to_active_model(record).insert(&txn).await {
            Ok(_) => {
                txn.commit().await?;
                Ok(InsertOutcome::Inserted(record.clone()))
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!("Rollback after failed insert also failed: {}", rollback_err);
                }
                // 并发写入时检查与插入之间仍可能冲突
                match e.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(message)) => {
                        Ok(InsertOutcome::Duplicate(duplicate_kind_from(&message)))
                    }
                    _ => Err(e.into()),
                }
            }
        }
    }

    async fn exists_by_url(&self, url: &str) -> Result<bool, RepositoryError> {
        let count = content_entity::Entity::find()
            .filter(content_entity::Column::SourceUrl.eq(url))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn exists_by_hash(&self, content_hash: &str) -> Result<bool, RepositoryError> {
        let count = content_entity::Entity::find()
            .filter(content_entity::Column::ContentHash.eq(content_hash))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapedContentRecord>, RepositoryError> {
        content_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(ScrapedContentRecord::try_from)
            .transpose()
    }

    async fn query(
        &self,
        query: ContentQuery,
    ) -> Result<(Vec<ScrapedContentRecord>, u64), RepositoryError> {
        let mut select = content_entity::Entity::find();
        if let Some(source_id) = query.source_id {
            select = select.filter(content_entity::Column::SourceId.eq(source_id));
        }
        if let Some(job_id) = query.job_id {
            select = select.filter(content_entity::Column::JobId.eq(job_id));
        }
        if let Some(language) = query.language {
            select = select.filter(content_entity::Column::Language.eq(language));
        }
        if let Some(status) = query.processing_status {
            select = select.filter(content_entity::Column::ProcessingStatus.eq(status.to_string()));
        }
        if let Some(text) = query.text.filter(|t| !t.trim().is_empty()) {
            let text = text.trim().to_string();
            select = select.filter(
                Condition::any()
                    .add(content_entity::Column::Title.contains(&text))
                    .add(content_entity::Column::Body.contains(&text)),
            );
        }

        let total = select.clone().count(self.db.as_ref()).await?;
        let records = select
            .order_by_desc(content_entity::Column::CreatedAt)
            .limit(query.limit)
            .offset(query.offset)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(ScrapedContentRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((records, total))
    }

    async fn update_processing_status(
        &self,
        id: Uuid,
        status: ProcessingStatus,
    ) -> Result<(), RepositoryError> {
        let result = content_entity::Entity::update_many()
            .col_expr(
                content_entity::Column::ProcessingStatus,
                Expr::value(status.to_string()),
            )
            .filter(content_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
