// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    application::{
        dto::content_request::{ContentListResponseDto, ContentQueryDto},
        use_cases::job_use_case::JobUseCase,
    },
    presentation::errors::AppError,
};

/// 查询已保存的内容
pub async fn list_content(
    Extension(use_case): Extension<Arc<JobUseCase>>,
    Query(params): Query<ContentQueryDto>,
) -> Result<impl IntoResponse, AppError> {
    let (items, total, query) = use_case.query_content(params).await?;
    Ok(Json(ContentListResponseDto {
        items,
        total,
        limit: query.limit,
        offset: query.offset,
    }))
}

pub async fn get_content(
    Extension(use_case): Extension<Arc<JobUseCase>>,
    Path(content_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(use_case.get_content(content_id).await?))
}
