// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 触发抓取任务请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TriggerJobRequestDto {
    /// 源 ID 或源名称
    #[validate(length(min = 1, message = "at least one source is required"))]
    pub sources: Vec<String>,
    /// 每个源最多处理的文章数
    #[validate(range(min = 1, max = 1000))]
    pub articles_per_source: u32,
    /// 是否记录选择器匹配轨迹
    #[serde(default)]
    pub enable_tracking: Option<bool>,
}

/// 任务列表查询参数
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct JobListQueryDto {
    pub status: Option<String>,
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// 任务日志查询参数
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct JobLogQueryDto {
    pub event_type: Option<String>,
    pub severity: Option<String>,
    pub correlation_id: Option<Uuid>,
    pub source_id: Option<Uuid>,
    #[validate(range(min = 1, max = 10000))]
    pub limit: Option<u64>,
}
