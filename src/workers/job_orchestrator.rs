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

use futures::stream::{self, StreamExt};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::domain::models::job::{DomainError, ScrapingJob};
use crate::domain::models::job_event::{EventType, Severity};
use crate::domain::models::source::Source;
use crate::domain::models::source_result::{JobTotals, SourceOutcome, SourceVerdict};
use crate::domain::repositories::job_repository::{JobRepository, RepositoryError};
use crate::domain::services::event_logger::{EventLogger, EventScope};
use crate::workers::manager::{CancellationFlag, JobManager};
use crate::workers::source_worker::{SourceTask, SourceWorker};

/// 源完成事件在 payload 中的类型标记
pub const SOURCE_COMPLETED: &str = "source_completed";

/// 编排器错误
///
/// 只有编排器自身的故障（如存储不可用）才会使整个任务失败。
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 任务编排器
///
/// 以有界并发处理任务中的各个源，源之间相互隔离。
/// 源结果只在编排器中汇总，工作任务不共享可变计数。
pub struct JobOrchestrator {
    job_repo: Arc<dyn JobRepository>,
    source_worker: Arc<SourceWorker>,
    logger: Arc<EventLogger>,
    manager: Arc<JobManager>,
    source_concurrency: usize,
}

impl JobOrchestrator {
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        source_worker: Arc<SourceWorker>,
        logger: Arc<EventLogger>,
        manager: Arc<JobManager>,
        source_concurrency: usize,
    ) -> Self {
        Self {
            job_repo,
            source_worker,
            logger,
            manager,
            source_concurrency: source_concurrency.max(1),
        }
    }

    pub fn manager(&self) -> &Arc<JobManager> {
        &self.manager
    }

    /// 在后台启动任务，立即返回
    pub fn launch(self: &Arc<Self>, job: ScrapingJob, sources: Vec<Source>) {
        let job_id = job.id;
        let cancel = self.manager.register(job_id);
        let orchestrator = Arc::clone(self);
        let handle = tokio::spawn(async move {
            if let Err(e) = orchestrator.run(job, sources, cancel).await {
                error!(%job_id, "Job aborted: {}", e);
            }
        });
        self.manager.track(job_id, handle);
    }

    /// 执行任务直到终态
    #[instrument(skip_all, fields(job_id = %job.id))]
    pub async fn run(
        &self,
        job: ScrapingJob,
        sources: Vec<Source>,
        cancel: CancellationFlag,
    ) -> Result<ScrapingJob, OrchestratorError> {
        let job_id = job.id;
        self.logger.register_job(job_id);
        let scope = self.logger.scope(job_id);

        let result = self.drive(job, sources, &cancel, &scope).await;
        if let Err(e) = &result {
            scope.error(
                EventType::Error,
                "Job aborted by orchestrator fault",
                json!({ "category": "orchestrator_fault", "error": e.to_string() }),
            );
        }

        self.logger.unregister_job(job_id);
        self.logger.flush().await;
        self.manager.finish(job_id);
        result
    }

    async fn drive(
        &self,
        job: ScrapingJob,
        sources: Vec<Source>,
        cancel: &CancellationFlag,
        scope: &EventScope,
    ) -> Result<ScrapingJob, OrchestratorError> {
        let started = job.clone().start()?;
        let job = match self.job_repo.update(&started).await {
            Ok(job) => job,
            // Conflict 表示任务已被外部置为终态
            Err(e @ RepositoryError::Conflict(_)) => return Err(e.into()),
            Err(e) => {
                self.escalate(job, &e, JobTotals::default()).await;
                return Err(e.into());
            }
        };
        info!(sources = sources.len(), "Job started");
        scope.info(
            EventType::Lifecycle,
            "Job started",
            json!({
                "sources": sources.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
                "articles_per_source": job.articles_per_source,
                "enable_tracking": job.enable_tracking,
            }),
        );

        let outcomes = self.run_sources(&job, sources, cancel, scope).await;
        let totals = JobTotals::fold(&outcomes);

        let finished = if cancel.is_cancelled() {
            let mut cancelled = job.clone().cancel()?;
            cancelled.apply_totals(totals);
            cancelled
        } else {
            job.clone().complete(&outcomes)?
        };

        let finished = match self.job_repo.update(&finished).await {
            Ok(saved) => saved,
            Err(e) => {
                self.escalate(job, &e, totals).await;
                return Err(e.into());
            }
        };

        info!(status = %finished.status, saved = totals.total_saved, "Job finished");
        scope.info(
            EventType::Lifecycle,
            "Job finished",
            json!({
                "status": finished.status,
                "totals": totals,
                "duration_ms": finished.duration_ms(),
            }),
        );
        Ok(finished)
    }

    /// 有界并发处理所有源，按完成顺序汇总
    async fn run_sources(
        &self,
        job: &ScrapingJob,
        sources: Vec<Source>,
        cancel: &CancellationFlag,
        scope: &EventScope,
    ) -> Vec<SourceOutcome> {
        let task = SourceTask {
            job_id: job.id,
            articles_per_source: job.articles_per_source as usize,
            enable_tracking: job.enable_tracking,
        };

        let runs = sources.into_iter().map(|source| {
            let worker = Arc::clone(&self.source_worker);
            let scope = scope.clone();
            let cancel = cancel.clone();
            async move {
                let source_id = source.id;
                let source_name = source.name.clone();
                // 源任务中的 panic 只影响该源
                let handle =
                    tokio::spawn(async move { worker.process(task, &source, scope, &cancel).await });
                match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        let kind = if e.is_panic() { "panicked" } else { "was aborted" };
                        SourceOutcome::faulted(
                            source_id,
                            source_name,
                            format!("source task {}: {}", kind, e),
                        )
                    }
                }
            }
        });

        let mut pending = stream::iter(runs).buffer_unordered(self.source_concurrency);
        let mut outcomes = Vec::new();
        while let Some(outcome) = pending.next().await {
            record_source_completion(scope, &outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    /// 编排器级故障：尽力将任务标记为失败
    async fn escalate(&self, job: ScrapingJob, cause: &RepositoryError, totals: JobTotals) {
        let mut failed = match job.fail(cause.to_string()) {
            Ok(failed) => failed,
            Err(e) => {
                error!("Cannot mark job as failed: {}", e);
                return;
            }
        };
        failed.apply_totals(totals);
        if let Err(e) = self.job_repo.update(&failed).await {
            error!(job_id = %failed.id, "Failed to persist job failure: {}", e);
        }
    }
}

fn record_source_completion(scope: &EventScope, outcome: &SourceOutcome) {
    let scope = scope.for_source(outcome.source_id());
    if let Some(fault) = &outcome.extraction.fault {
        scope.error(
            EventType::Error,
            "Source fault",
            json!({ "category": "source_fault", "error": fault }),
        );
    }

    let verdict = outcome.verdict();
    let severity = match verdict {
        SourceVerdict::Succeeded | SourceVerdict::ZeroYield => Severity::Info,
        SourceVerdict::Degraded | SourceVerdict::Failed => Severity::Warning,
    };
    scope.emit(
        severity,
        EventType::Lifecycle,
        format!("Source '{}' completed", outcome.extraction.source_name),
        json!({
            "kind": SOURCE_COMPLETED,
            "verdict": verdict,
            "outcome": outcome,
        }),
    );
}
