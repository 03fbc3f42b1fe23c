// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{extract::Extension, response::IntoResponse, Json};
use std::sync::Arc;

use crate::{application::use_cases::job_use_case::JobUseCase, presentation::errors::AppError};

/// 列出激活的源（只读）
pub async fn list_sources(
    Extension(use_case): Extension<Arc<JobUseCase>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(use_case.list_sources().await?))
}
