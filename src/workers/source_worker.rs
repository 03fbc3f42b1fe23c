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
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::domain::models::article::{ExtractedArticle, ExtractionCandidate};
use crate::domain::models::job_event::{EventType, Severity};
use crate::domain::models::source::Source;
use crate::domain::models::source_result::SourceOutcome;
use crate::domain::repositories::content_repository::DuplicateKind;
use crate::domain::services::deduplicator::Deduplicator;
use crate::domain::services::event_logger::EventScope;
use crate::domain::services::extraction::{ContentExtractor, ExtractionFailure, FailureReason};
use crate::domain::services::feed_reader::FeedReader;
use crate::domain::services::persistence_gateway::{PersistenceGateway, SaveOutcome};
use crate::engines::resource_controller::{ResourceController, SourceGate};
use crate::engines::traits::{EngineError, FetchRequest, FetchResponse, PageFetcher};
use crate::utils::robots::RobotsCheckerTrait;
use crate::workers::manager::CancellationFlag;

/// 单个源在一次任务中的处理参数
#[derive(Debug, Clone, Copy)]
pub struct SourceTask {
    pub job_id: Uuid,
    pub articles_per_source: usize,
    pub enable_tracking: bool,
}

/// 单个候选的处理结果
#[derive(Debug)]
enum CandidateOutcome {
    /// 任务已取消，未处理
    Skipped,
    /// 抓取前即发现 URL 已入库
    KnownUrl,
    /// 抓取或抽取失败
    Failed(ExtractionFailure),
    /// 抽取成功，附带持久化结果
    Extracted(SaveOutcome),
}

/// 源处理器
///
/// 负责单个源的完整流水线：Feed → 候选 → 抓取 → 抽取 → 去重 → 保存。
/// 所有失败都在源边界内转换为统计数据，不会向上传播。
pub struct SourceWorker {
    fetcher: Arc<dyn PageFetcher>,
    controller: Arc<ResourceController>,
    feed_reader: FeedReader,
    extractor: Arc<ContentExtractor>,
    deduplicator: Deduplicator,
    gateway: PersistenceGateway,
    robots: Arc<dyn RobotsCheckerTrait>,
}

impl SourceWorker {
    /// 创建新的源处理器实例
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        controller: Arc<ResourceController>,
        feed_reader: FeedReader,
        extractor: Arc<ContentExtractor>,
        deduplicator: Deduplicator,
        gateway: PersistenceGateway,
        robots: Arc<dyn RobotsCheckerTrait>,
    ) -> Self {
        Self {
            fetcher,
            controller,
            feed_reader,
            extractor,
            deduplicator,
            gateway,
            robots,
        }
    }

    /// 处理一个源，返回两阶段统计
    #[instrument(skip_all, fields(job_id = %task.job_id, source = %source.name))]
    pub async fn process(
        &self,
        task: SourceTask,
        source: &Source,
        scope: EventScope,
        cancel: &CancellationFlag,
    ) -> SourceOutcome {
        let scope = scope.for_source(source.id);
        let mut outcome = SourceOutcome::new(source.id, source.name.clone());
        scope.info(
            EventType::Lifecycle,
            format!("Source '{}' processing started", source.name),
            json!({ "feed_url": source.feed_url, "limit": task.articles_per_source }),
        );

        let gate = self.gate_for(source).await;

        match self
            .feed_reader
            .fetch_candidates(source, &gate, task.articles_per_source)
            .await
        {
            Ok(candidates) => {
                outcome.extraction.candidates_seen = candidates.len() as u32;
                scope.info(
                    EventType::Http,
                    format!("Feed yielded {} candidate(s)", candidates.len()),
                    json!({ "feed_url": source.feed_url, "candidates": candidates.len() }),
                );

                let results: Vec<CandidateOutcome> = stream::iter(candidates)
                    .map(|candidate| {
                        self.process_candidate(task, source, &gate, &scope, cancel, candidate)
                    })
                    .buffered(self.controller.per_source_concurrency().max(1))
                    .collect()
                    .await;

                for result in results {
                    tally(&mut outcome, result);
                }
            }
            Err(e) => {
                warn!(feed_url = %source.feed_url, "Feed unavailable: {}", e);
                scope.error(
                    EventType::Error,
                    "Feed unavailable",
                    json!({ "category": "feed_unavailable", "error": e.to_string() }),
                );
                outcome.extraction.feed_error = Some(e.to_string());
            }
        }

        if outcome.extraction.candidates_skipped > 0 {
            scope.warn(
                EventType::Lifecycle,
                "Job cancelled, remaining candidates skipped",
                json!({ "skipped": outcome.extraction.candidates_skipped }),
            );
        }

        // 清理故障只记录，不改变该源的判定
        if let Err(e) = self.fetcher.teardown(source.id).await {
            warn!(source_id = %source.id, "Engine teardown fault: {}", e);
            scope.warn(
                EventType::Error,
                "Engine teardown fault",
                json!({ "category": "teardown_fault", "engine": self.fetcher.name(), "error": e.to_string() }),
            );
            outcome.extraction.teardown_fault = Some(e.to_string());
        }

        outcome
    }

    /// 源闸门，延迟取礼貌策略与 robots Crawl-delay 中的较大者
    async fn gate_for(&self, source: &Source) -> Arc<SourceGate> {
        let mut delay = source.policy.delay();
        if source.policy.respect_robots {
            match self
                .robots
                .get_crawl_delay(&source.feed_url, &source.policy.user_agent)
                .await
            {
                Ok(Some(crawl_delay)) => delay = delay.max(crawl_delay),
                Ok(None) => {}
                Err(e) => debug!(source_id = %source.id, "Crawl-delay lookup failed: {}", e),
            }
        }
        self.controller.gate(source.id, delay)
    }

    async fn process_candidate(
        &self,
        task: SourceTask,
        source: &Source,
        gate: &SourceGate,
        scope: &EventScope,
        cancel: &CancellationFlag,
        candidate: ExtractionCandidate,
    ) -> CandidateOutcome {
        if cancel.is_cancelled() {
            return CandidateOutcome::Skipped;
        }
        let scope = scope.correlated();
        let candidate = &candidate;

        match self.deduplicator.is_known_url(&candidate.url).await {
            Ok(true) => {
                scope.emit(
                    Severity::Debug,
                    EventType::Persistence,
                    "URL already stored, skipping fetch",
                    json!({ "url": candidate.url, "duplicate": DuplicateKind::Url }),
                );
                return CandidateOutcome::KnownUrl;
            }
            Ok(false) => {}
            // 保存事务仍会检查唯一性
            Err(e) => warn!(url = %candidate.url, "URL pre-check failed: {}", e),
        }

        if source.policy.respect_robots {
            match self
                .robots
                .is_allowed(&candidate.url, &source.policy.user_agent)
                .await
            {
                Ok(false) => {
                    let failure =
                        ExtractionFailure::new(candidate.url.clone(), FailureReason::RobotsDisallowed);
                    return self.record_failure(&scope, failure);
                }
                Ok(true) => {}
                Err(e) => debug!(url = %candidate.url, "Robots check failed, allowing: {}", e),
            }
        }

        let response = match self.fetch_page(source, gate, candidate).await {
            Ok(response) => response,
            Err(e) => {
                let failure = ExtractionFailure::new(candidate.url.clone(), failure_reason(&e));
                return self.record_failure(&scope, failure);
            }
        };
        scope.info(
            EventType::Http,
            "Page fetched",
            json!({
                "url": candidate.url,
                "status": response.status_code,
                "response_time_ms": response.response_time_ms,
            }),
        );

        let article = match self.extractor.extract(
            candidate,
            &response.content,
            &source.content_selectors,
            task.enable_tracking,
        ) {
            Ok(article) => article,
            Err(failure) => return self.record_failure(&scope, failure),
        };
        metrics::counter!("articles_extracted_total").increment(1);
        scope.info(
            EventType::Extraction,
            "Article extracted",
            json!({
                "url": article.url,
                "method": article.method,
                "length": article.body.chars().count(),
                "quality_score": article.quality_score,
                "language": article.language,
                "traces": article.traces,
            }),
        );

        let saved = self.persist(task, source.id, &article).await;
        match &saved {
            SaveOutcome::Saved { content_id } => scope.info(
                EventType::Persistence,
                "Article saved",
                json!({ "url": article.url, "content_id": content_id }),
            ),
            SaveOutcome::DuplicateSkipped { kind } => scope.info(
                EventType::Persistence,
                "Duplicate content skipped",
                json!({ "url": article.url, "duplicate": kind, "fingerprint": article.fingerprint }),
            ),
            SaveOutcome::SaveFailure { cause } => scope.error(
                EventType::Persistence,
                "Article save failed",
                json!({ "category": "save_failure", "url": article.url, "error": cause }),
            ),
        }
        CandidateOutcome::Extracted(saved)
    }

    async fn fetch_page(
        &self,
        source: &Source,
        gate: &SourceGate,
        candidate: &ExtractionCandidate,
    ) -> Result<FetchResponse, EngineError> {
        let request = FetchRequest::new(
            candidate.url.clone(),
            source.policy.user_agent.clone(),
            source.policy.timeout(),
        )
        .for_source(source.id);

        self.controller
            .fetch(self.fetcher.as_ref(), gate, &request)
            .await?
            .ensure_success()
    }

    async fn persist(&self, task: SourceTask, source_id: Uuid, article: &ExtractedArticle) -> SaveOutcome {
        match self.deduplicator.check(&article.url, &article.fingerprint).await {
            Ok(Some(kind)) => {
                metrics::counter!("articles_duplicate_total").increment(1);
                SaveOutcome::DuplicateSkipped { kind }
            }
            Ok(None) => self.gateway.save(article, source_id, Some(task.job_id)).await,
            Err(e) => {
                warn!(url = %article.url, "Duplicate check failed, relying on store constraints: {}", e);
                self.gateway.save(article, source_id, Some(task.job_id)).await
            }
        }
    }

    fn record_failure(&self, scope: &EventScope, failure: ExtractionFailure) -> CandidateOutcome {
        metrics::counter!("extraction_failures_total").increment(1);
        debug!(url = %failure.url, reason = %failure.reason, "Extraction failed");
        scope.warn(
            EventType::Extraction,
            "Extraction failed",
            json!({
                "url": failure.url,
                "reason": failure.reason.code(),
                "detail": failure.reason.to_string(),
                "best_length": failure.best_length,
                "traces": failure.traces,
            }),
        );
        CandidateOutcome::Failed(failure)
    }
}

fn failure_reason(error: &EngineError) -> FailureReason {
    match error {
        EngineError::Timeout => FailureReason::Timeout,
        EngineError::HttpStatus(status) => FailureReason::HttpStatus(*status),
        EngineError::RequestFailed(e) if e.is_timeout() => FailureReason::Timeout,
        other => FailureReason::Fetch(other.to_string()),
    }
}

/// 将候选结果计入源统计
fn tally(outcome: &mut SourceOutcome, result: CandidateOutcome) {
    let extraction = &mut outcome.extraction;
    let persistence = &mut outcome.persistence;
    match result {
        CandidateOutcome::Skipped => extraction.candidates_skipped += 1,
        CandidateOutcome::KnownUrl => persistence.duplicate_urls += 1,
        CandidateOutcome::Failed(_) => {
            extraction.extraction_attempts += 1;
            extraction.extraction_failures += 1;
        }
        CandidateOutcome::Extracted(saved) => {
            extraction.extraction_attempts += 1;
            extraction.extraction_successes += 1;
            match saved {
                SaveOutcome::Saved { .. } => persistence.articles_saved += 1,
                SaveOutcome::DuplicateSkipped {
                    kind: DuplicateKind::Url,
                } => persistence.duplicate_urls += 1,
                SaveOutcome::DuplicateSkipped {
                    kind: DuplicateKind::ContentHash,
                } => persistence.duplicate_content += 1,
                SaveOutcome::SaveFailure { .. } => persistence.save_failures += 1,
            }
        }
    }
}
