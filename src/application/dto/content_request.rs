// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::article::ScrapedContentRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 内容查询参数
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContentQueryDto {
    pub source_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    #[validate(length(min = 2, max = 8))]
    pub language: Option<String>,
    pub processing_status: Option<String>,
    /// 标题或正文中的关键字
    #[validate(length(max = 200))]
    pub q: Option<String>,
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// 内容列表响应
#[derive(Debug, Serialize)]
pub struct ContentListResponseDto {
    pub items: Vec<ScrapedContentRecord>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}
