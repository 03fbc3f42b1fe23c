// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{JobStatus, ScrapingJob};
use crate::domain::models::job_event::JobEvent;
use crate::domain::models::source_result::{SourceOutcome, SourceVerdict};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 触发任务响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerJobResponseDto {
    pub job_id: Uuid,
    pub status: &'static str,
}

impl TriggerJobResponseDto {
    pub fn started(job_id: Uuid) -> Self {
        Self {
            job_id,
            status: "started",
        }
    }
}

/// 单个源的结果明细
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceResultDto {
    pub source_id: Uuid,
    pub source_name: String,
    pub verdict: SourceVerdict,
    pub candidates_seen: u32,
    pub extracted: u32,
    pub extraction_failures: u32,
    pub skipped: u32,
    pub saved: u32,
    pub duplicates: u32,
    pub save_failures: u32,
    pub feed_error: Option<String>,
    pub fault: Option<String>,
    pub teardown_fault: Option<String>,
}

impl From<&SourceOutcome> for SourceResultDto {
    fn from(outcome: &SourceOutcome) -> Self {
        let extraction = &outcome.extraction;
        let persistence = &outcome.persistence;
        Self {
            source_id: extraction.source_id,
            source_name: extraction.source_name.clone(),
            verdict: outcome.verdict(),
            candidates_seen: extraction.candidates_seen,
            extracted: extraction.extraction_successes,
            extraction_failures: extraction.extraction_failures,
            skipped: extraction.candidates_skipped,
            saved: persistence.articles_saved,
            duplicates: persistence.duplicates_skipped(),
            save_failures: persistence.save_failures,
            feed_error: extraction.feed_error.clone(),
            fault: extraction.fault.clone(),
            teardown_fault: extraction.teardown_fault.clone(),
        }
    }
}

/// 任务详情响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponseDto {
    pub id: Uuid,
    pub status: JobStatus,
    pub source_ids: Vec<Uuid>,
    pub articles_per_source: u32,
    pub enable_tracking: bool,
    pub total_extracted: u32,
    pub total_saved: u32,
    pub total_duplicates: u32,
    pub total_errors: u32,
    pub error_message: Option<String>,
    pub triggered_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_results: Option<Vec<SourceResultDto>>,
}

impl JobResponseDto {
    pub fn from_job(job: &ScrapingJob, outcomes: Option<&[SourceOutcome]>) -> Self {
        Self {
            id: job.id,
            status: job.status,
            source_ids: job.source_ids.clone(),
            articles_per_source: job.articles_per_source,
            enable_tracking: job.enable_tracking,
            total_extracted: job.total_extracted,
            total_saved: job.total_saved,
            total_duplicates: job.total_duplicates,
            total_errors: job.total_errors,
            error_message: job.error_message.clone(),
            triggered_at: job.triggered_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            duration_ms: job.duration_ms(),
            source_results: outcomes
                .map(|outcomes| outcomes.iter().map(SourceResultDto::from).collect()),
        }
    }
}

/// 任务列表响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListResponseDto {
    pub jobs: Vec<JobResponseDto>,
    pub total: u64,
    pub has_more: bool,
}

/// 任务日志响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLogsResponseDto {
    pub job_id: Uuid,
    pub total: usize,
    pub events: Vec<JobEvent>,
}

/// 取消任务响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelJobResponseDto {
    pub job_id: Uuid,
    /// `cancelling` 表示任务仍在运行，当前候选处理完后停止
    pub status: &'static str,
}
