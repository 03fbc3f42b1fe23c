// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::application::use_cases::job_use_case::JobUseCase;
use crate::config::settings::Settings;
use crate::domain::models::source::PolitenessPolicy;
use crate::domain::repositories::content_repository::ContentRepository;
use crate::domain::repositories::job_event_repository::JobEventRepository;
use crate::domain::repositories::job_repository::JobRepository;
use crate::domain::repositories::source_repository::SourceRepository;
use crate::domain::services::deduplicator::Deduplicator;
use crate::domain::services::event_logger::EventLogger;
use crate::domain::services::extraction::ContentExtractor;
use crate::domain::services::feed_reader::FeedReader;
use crate::domain::services::persistence_gateway::PersistenceGateway;
use crate::engines::resource_controller::ResourceController;
use crate::engines::traits::PageFetcher;
use crate::infrastructure::repositories::content_repo_impl::ContentRepositoryImpl;
use crate::infrastructure::repositories::job_event_repo_impl::JobEventRepositoryImpl;
use crate::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use crate::infrastructure::repositories::source_repo_impl::SourceRepositoryImpl;
use crate::presentation::routes;
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::robots::RobotsChecker;
use crate::workers::job_orchestrator::JobOrchestrator;
use crate::workers::manager::JobManager;
use crate::workers::source_worker::SourceWorker;

/// 组装完成的应用组件
pub struct App {
    pub use_case: Arc<JobUseCase>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub logger: Arc<EventLogger>,
    pub manager: Arc<JobManager>,
    pub controller: Arc<ResourceController>,
    pub job_repo: Arc<dyn JobRepository>,
    pub source_repo: Arc<dyn SourceRepository>,
    pub content_repo: Arc<dyn ContentRepository>,
    pub event_repo: Arc<dyn JobEventRepository>,
}

impl App {
    /// 按配置组装所有组件
    ///
    /// 需要在 tokio 运行时内调用：事件记录器会启动后台写入任务。
    pub fn build(
        settings: &Settings,
        db: Arc<DatabaseConnection>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        let scraper = &settings.scraper;

        let job_repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(db.clone()));
        let source_repo: Arc<dyn SourceRepository> =
            Arc::new(SourceRepositoryImpl::new(db.clone()));
        let content_repo: Arc<dyn ContentRepository> =
            Arc::new(ContentRepositoryImpl::new(db.clone()));
        let event_repo: Arc<dyn JobEventRepository> = Arc::new(JobEventRepositoryImpl::new(db));

        let controller = Arc::new(ResourceController::new(
            scraper.per_source_concurrency,
            scraper.global_fetch_limit,
        ));
        let logger = Arc::new(EventLogger::new(
            event_repo.clone(),
            controller.clone(),
            scraper.snapshot_interval(),
        ));

        let source_worker = Arc::new(SourceWorker::new(
            fetcher.clone(),
            controller.clone(),
            FeedReader::new(
                fetcher.clone(),
                controller.clone(),
                RetryPolicy::feed(scraper.feed_retries),
            ),
            Arc::new(ContentExtractor::new(settings.extraction_config())),
            Deduplicator::new(content_repo.clone()),
            PersistenceGateway::new(content_repo.clone(), scraper.compress_payload),
            Arc::new(
                RobotsChecker::new(fetcher)
                    .with_retry_policy(RetryPolicy::feed(scraper.feed_retries)),
            ),
        ));

        let manager = Arc::new(JobManager::new());
        let orchestrator = Arc::new(JobOrchestrator::new(
            job_repo.clone(),
            source_worker,
            logger.clone(),
            manager.clone(),
            scraper.source_concurrency,
        ));

        let policy_defaults = PolitenessPolicy {
            user_agent: scraper.user_agent.clone(),
            timeout_ms: scraper.default_timeout_ms,
            ..Default::default()
        };
        let use_case = Arc::new(
            JobUseCase::new(
                job_repo.clone(),
                source_repo.clone(),
                content_repo.clone(),
                event_repo.clone(),
                orchestrator.clone(),
            )
            .with_policy_defaults(policy_defaults),
        );

        Self {
            use_case,
            orchestrator,
            logger,
            manager,
            controller,
            job_repo,
            source_repo,
            content_repo,
            event_repo,
        }
    }

    pub fn router(&self) -> Router {
        routes::routes(self.use_case.clone())
    }

    /// 取消运行中的任务并写完剩余事件
    pub async fn shutdown(&self) {
        self.manager.shutdown().await;
        self.logger.shutdown().await;
    }
}
