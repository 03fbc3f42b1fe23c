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

use crate::{
    application::dto::{
        content_request::ContentQueryDto,
        job_request::{JobListQueryDto, JobLogQueryDto, TriggerJobRequestDto},
    },
    domain::{
        models::{
            article::{ProcessingStatus, ScrapedContentRecord},
            job::{JobStatus, ScrapingJob},
            job_event::{EventType, JobEvent, Severity},
            source::{PolitenessPolicy, Source},
            source_result::SourceOutcome,
        },
        repositories::{
            content_repository::{ContentQuery, ContentRepository},
            job_event_repository::{JobEventQuery, JobEventRepository},
            job_repository::{JobQueryParams, JobRepository, RepositoryError},
            source_repository::SourceRepository,
        },
    },
    workers::job_orchestrator::{JobOrchestrator, SOURCE_COMPLETED},
};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE_SIZE: u64 = 50;

#[derive(Error, Debug)]
pub enum JobUseCaseError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// 取消请求的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelResult {
    /// 任务在本进程运行，当前候选完成后停止
    Cancelling,
    /// 任务未在运行，直接标记为已取消
    Cancelled,
}

impl CancelResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelResult::Cancelling => "cancelling",
            CancelResult::Cancelled => "cancelled",
        }
    }
}

/// 任务详情：任务记录与各源结果明细
#[derive(Debug, Clone)]
pub struct JobDetails {
    pub job: ScrapingJob,
    pub source_results: Vec<SourceOutcome>,
}

/// 抓取任务用例
///
/// 触发调用只校验输入并登记任务，抓取结果只能通过查询任务状态与日志获得。
pub struct JobUseCase {
    job_repo: Arc<dyn JobRepository>,
    source_repo: Arc<dyn SourceRepository>,
    content_repo: Arc<dyn ContentRepository>,
    event_repo: Arc<dyn JobEventRepository>,
    orchestrator: Arc<JobOrchestrator>,
    policy_defaults: PolitenessPolicy,
}

impl JobUseCase {
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        source_repo: Arc<dyn SourceRepository>,
        content_repo: Arc<dyn ContentRepository>,
        event_repo: Arc<dyn JobEventRepository>,
        orchestrator: Arc<JobOrchestrator>,
    ) -> Self {
        Self {
            job_repo,
            source_repo,
            content_repo,
            event_repo,
            orchestrator,
            policy_defaults: PolitenessPolicy::default(),
        }
    }

    /// 源未配置 User-Agent 或超时时使用的默认值
    pub fn with_policy_defaults(mut self, policy_defaults: PolitenessPolicy) -> Self {
        self.policy_defaults = policy_defaults;
        self
    }

    pub fn orchestrator(&self) -> &Arc<JobOrchestrator> {
        &self.orchestrator
    }

    /// 触发任务并在后台执行
    pub async fn trigger(&self, dto: TriggerJobRequestDto) -> Result<ScrapingJob, JobUseCaseError> {
        dto.validate()
            .map_err(|e| JobUseCaseError::ValidationError(e.to_string()))?;

        let sources = self.resolve_sources(&dto.sources).await?;
        let job = ScrapingJob::new(
            sources.iter().map(|s| s.id).collect(),
            dto.articles_per_source,
            dto.enable_tracking.unwrap_or(false),
        );
        let job = self.job_repo.create(&job).await?;
        info!(job_id = %job.id, sources = sources.len(), "Job triggered");

        self.orchestrator.launch(job.clone(), sources);
        Ok(job)
    }

    /// 按 ID 或名称解析激活的源，保持请求顺序并去重
    async fn resolve_sources(&self, identifiers: &[String]) -> Result<Vec<Source>, JobUseCaseError> {
        let active = self.source_repo.find_active().await?;
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(identifiers.len());
        let mut unknown = Vec::new();

        for identifier in identifiers {
            match active.iter().find(|s| s.matches_identifier(identifier)) {
                Some(source) => {
                    if seen.insert(source.id) {
                        resolved.push(source.clone().with_policy_fallbacks(&self.policy_defaults));
                    }
                }
                None => unknown.push(identifier.as_str()),
            }
        }

        if !unknown.is_empty() {
            return Err(JobUseCaseError::ValidationError(format!(
                "unknown or inactive source(s): {}",
                unknown.join(", ")
            )));
        }
        Ok(resolved)
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<JobDetails, JobUseCaseError> {
        let job = self.find_job(job_id).await?;

        let mut query = JobEventQuery::for_job(job_id);
        query.event_type = Some(EventType::Lifecycle);
        let source_results = self
            .event_repo
            .query(query)
            .await?
            .iter()
            .filter_map(source_outcome_from_event)
            .collect();

        Ok(JobDetails {
            job,
            source_results,
        })
    }

    pub async fn list_jobs(
        &self,
        dto: JobListQueryDto,
    ) -> Result<(Vec<ScrapingJob>, u64), JobUseCaseError> {
        dto.validate()
            .map_err(|e| JobUseCaseError::ValidationError(e.to_string()))?;
        let status = dto
            .status
            .as_deref()
            .map(|s| {
                s.parse::<JobStatus>()
                    .map_err(|_| JobUseCaseError::ValidationError(format!("invalid status '{}'", s)))
            })
            .transpose()?;

        let params = JobQueryParams {
            status,
            limit: dto.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: dto.offset.unwrap_or(0),
        };
        Ok(self.job_repo.list(params).await?)
    }

    /// 查询任务日志，按时间顺序返回
    pub async fn job_logs(
        &self,
        job_id: Uuid,
        dto: JobLogQueryDto,
    ) -> Result<Vec<JobEvent>, JobUseCaseError> {
        dto.validate()
            .map_err(|e| JobUseCaseError::ValidationError(e.to_string()))?;
        self.find_job(job_id).await?;

        let event_type = dto
            .event_type
            .as_deref()
            .map(|s| {
                s.parse::<EventType>().map_err(|_| {
                    JobUseCaseError::ValidationError(format!("invalid event type '{}'", s))
                })
            })
            .transpose()?;
        let severity = dto
            .severity
            .as_deref()
            .map(|s| {
                s.parse::<Severity>()
                    .map_err(|_| JobUseCaseError::ValidationError(format!("invalid severity '{}'", s)))
            })
            .transpose()?;

        let query = JobEventQuery {
            job_id,
            source_id: dto.source_id,
            event_type,
            severity,
            correlation_id: dto.correlation_id,
            limit: dto.limit,
        };
        Ok(self.event_repo.query(query).await?)
    }

    pub async fn cancel_job(&self, job_id: Uuid) -> Result<CancelResult, JobUseCaseError> {
        let job = self.find_job(job_id).await?;
        if job.status.is_terminal() {
            return Err(JobUseCaseError::Conflict(format!(
                "job already finished with status {}",
                job.status
            )));
        }

        if self.orchestrator.manager().cancel(job_id) {
            return Ok(CancelResult::Cancelling);
        }

        // 不在本进程运行（例如进程重启前遗留的任务）
        let cancelled = job
            .cancel()
            .map_err(|e| JobUseCaseError::Conflict(e.to_string()))?;
        self.job_repo.update(&cancelled).await.map_err(|e| match e {
            RepositoryError::Conflict(msg) => JobUseCaseError::Conflict(msg),
            other => JobUseCaseError::Repository(other),
        })?;
        Ok(CancelResult::Cancelled)
    }

    pub async fn list_sources(&self) -> Result<Vec<Source>, JobUseCaseError> {
        Ok(self.source_repo.find_active().await?)
    }

    pub async fn query_content(
        &self,
        dto: ContentQueryDto,
    ) -> Result<(Vec<ScrapedContentRecord>, u64, ContentQuery), JobUseCaseError> {
        dto.validate()
            .map_err(|e| JobUseCaseError::ValidationError(e.to_string()))?;
        let processing_status = dto
            .processing_status
            .as_deref()
            .map(|s| {
                s.parse::<ProcessingStatus>().map_err(|_| {
                    JobUseCaseError::ValidationError(format!("invalid processing status '{}'", s))
                })
            })
            .transpose()?;

        let query = ContentQuery {
            source_id: dto.source_id,
            job_id: dto.job_id,
            language: dto.language.map(|l| l.to_lowercase()),
            processing_status,
            text: dto.q,
            limit: dto.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: dto.offset.unwrap_or(0),
        };
        let (items, total) = self.content_repo.query(query.clone()).await?;
        Ok((items, total, query))
    }

    pub async fn get_content(&self, id: Uuid) -> Result<ScrapedContentRecord, JobUseCaseError> {
        self.content_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| JobUseCaseError::NotFound(format!("content {}", id)))
    }

    async fn find_job(&self, job_id: Uuid) -> Result<ScrapingJob, JobUseCaseError> {
        self.job_repo
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| JobUseCaseError::NotFound(format!("job {}", job_id)))
    }
}

/// 从 source_completed 事件还原源结果
fn source_outcome_from_event(event: &JobEvent) -> Option<SourceOutcome> {
    if event.payload.get("kind").and_then(|k| k.as_str()) != Some(SOURCE_COMPLETED) {
        return None;
    }
    let outcome = event.payload.get("outcome")?.clone();
    match serde_json::from_value(outcome) {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::warn!(event_id = %event.id, "Malformed source_completed payload: {}", e);
            None
        }
    }
}
