// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::job_repository::RepositoryError;
use crate::domain::models::source::Source;
use async_trait::async_trait;
use uuid::Uuid;

/// 内容源仓库特质
///
/// 源由外部的源管理服务维护，引擎只读。
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// 根据ID查找源
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Source>, RepositoryError>;
    /// 列出所有激活的源
    async fn find_active(&self) -> Result<Vec<Source>, RepositoryError>;
}
