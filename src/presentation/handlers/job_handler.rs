// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    application::{
        dto::{
            job_request::{JobListQueryDto, JobLogQueryDto, TriggerJobRequestDto},
            job_response::{
                CancelJobResponseDto, JobListResponseDto, JobLogsResponseDto, JobResponseDto,
                TriggerJobResponseDto,
            },
        },
        use_cases::job_use_case::{JobUseCase, JobUseCaseError},
    },
    presentation::errors::AppError,
};

/// 触发抓取任务
///
/// 只校验输入并立即返回任务 ID，抓取在后台进行。
pub async fn trigger_job(
    Extension(use_case): Extension<Arc<JobUseCase>>,
    payload: Result<Json<TriggerJobRequestDto>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) =
        payload.map_err(|e| JobUseCaseError::ValidationError(e.body_text()))?;
    let job = use_case.trigger(payload).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(TriggerJobResponseDto::started(job.id)),
    ))
}

/// 获取任务详情及各源结果
pub async fn get_job(
    Extension(use_case): Extension<Arc<JobUseCase>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let details = use_case.get_job(job_id).await?;
    Ok(Json(JobResponseDto::from_job(
        &details.job,
        Some(&details.source_results),
    )))
}

/// 列出任务
pub async fn list_jobs(
    Extension(use_case): Extension<Arc<JobUseCase>>,
    Query(params): Query<JobListQueryDto>,
) -> Result<impl IntoResponse, AppError> {
    let offset = params.offset.unwrap_or(0);
    let (jobs, total) = use_case.list_jobs(params).await?;
    let has_more = offset + (jobs.len() as u64) < total;
    Ok(Json(JobListResponseDto {
        jobs: jobs
            .iter()
            .map(|job| JobResponseDto::from_job(job, None))
            .collect(),
        total,
        has_more,
    }))
}

/// 获取任务日志
pub async fn get_job_logs(
    Extension(use_case): Extension<Arc<JobUseCase>>,
    Path(job_id): Path<Uuid>,
    Query(params): Query<JobLogQueryDto>,
) -> Result<impl IntoResponse, AppError> {
    let events = use_case.job_logs(job_id, params).await?;
    Ok(Json(JobLogsResponseDto {
        job_id,
        total: events.len(),
        events,
    }))
}

/// 取消任务
pub async fn cancel_job(
    Extension(use_case): Extension<Arc<JobUseCase>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = use_case.cancel_job(job_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CancelJobResponseDto {
            job_id,
            status: result.as_str(),
        }),
    ))
}
