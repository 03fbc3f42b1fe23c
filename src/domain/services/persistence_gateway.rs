// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::models::article::{ExtractedArticle, ScrapedContentRecord};
use crate::domain::repositories::content_repository::{
    ContentRepository, DuplicateKind, InsertOutcome,
};
use crate::utils::compression;

/// 单篇文章的保存结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SaveOutcome {
    Saved { content_id: Uuid },
    DuplicateSkipped { kind: DuplicateKind },
    SaveFailure { cause: String },
}

/// 持久化网关
///
/// 每篇文章一个事务，单篇失败不会影响同批其他文章。
/// 失败不在本次任务内自动重试。
#[derive(Clone)]
pub struct PersistenceGateway {
    content_repo: Arc<dyn ContentRepository>,
    compress_payload: bool,
}

impl PersistenceGateway {
    pub fn new(content_repo: Arc<dyn ContentRepository>, compress_payload: bool) -> Self {
        Self {
            content_repo,
            compress_payload,
        }
    }

    pub async fn save(
        &self,
        article: &ExtractedArticle,
        source_id: Uuid,
        job_id: Option<Uuid>,
    ) -> SaveOutcome {
        let payload = if self.compress_payload {
            match compression::compress(&article.body) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!(url = %article.url, "Payload compression failed: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let record = ScrapedContentRecord::from_article(article, source_id, job_id, payload);
        match self.content_repo.insert_unique(&record).await {
            Ok(InsertOutcome::Inserted(saved)) => {
                metrics::counter!("articles_saved_total").increment(1);
                SaveOutcome::Saved {
                    content_id: saved.id,
                }
            }
            Ok(InsertOutcome::Duplicate(kind)) => {
                metrics::counter!("articles_duplicate_total").increment(1);
                SaveOutcome::DuplicateSkipped { kind }
            }
            Err(e) => {
                metrics::counter!("save_failures_total").increment(1);
                tracing::error!(url = %article.url, %source_id, "Failed to save article: {}", e);
                SaveOutcome::SaveFailure {
                    cause: e.to_string(),
                }
            }
        }
    }
}
