// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::*;
use async_trait::async_trait;
use newsrs::application::dto::job_request::{JobLogQueryDto, TriggerJobRequestDto};
use newsrs::application::use_cases::job_use_case::CancelResult;
use newsrs::domain::models::job::JobStatus;
use newsrs::domain::models::job_event::{EventType, Severity};
use newsrs::domain::models::source_result::SourceVerdict;
use newsrs::domain::repositories::content_repository::ContentQuery;
use newsrs::engines::reqwest_engine::ReqwestEngine;
use newsrs::engines::traits::{EngineError, FetchRequest, FetchResponse, PageFetcher};
use newsrs::utils::compression;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn trigger(sources: &[&str], articles_per_source: u32) -> TriggerJobRequestDto {
    TriggerJobRequestDto {
        sources: sources.iter().map(|s| s.to_string()).collect(),
        articles_per_source,
        enable_tracking: None,
    }
}

/// 包装真实引擎，可注入清理故障或 panic
struct FaultyFetcher {
    inner: ReqwestEngine,
    failing_teardown: Option<Uuid>,
    panic_on: Option<&'static str>,
}

impl FaultyFetcher {
    fn new() -> Self {
        Self {
            inner: ReqwestEngine::new().expect("http client"),
            failing_teardown: None,
            panic_on: None,
        }
    }
}

#[async_trait]
impl PageFetcher for FaultyFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        if let Some(marker) = self.panic_on {
            if request.url.contains(marker) {
                panic!("engine crashed while rendering {}", request.url);
            }
        }
        self.inner.fetch(request).await
    }

    async fn teardown(&self, source_id: Uuid) -> Result<(), EngineError> {
        if self.failing_teardown == Some(source_id) {
            return Err(EngineError::Teardown("browser context already closed".to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "faulty"
    }
}

#[tokio::test]
async fn test_unreachable_source_yields_partial_job() {
    let server = MockServer::start().await;
    let db = setup_db().await;
    let app = build_app(db.clone()).await;

    // A 的 feed 未挂载，wiremock 返回 404
    let source_a = test_source("A", format!("{}/a/feed.xml", server.uri()));
    let source_b = test_source("B", mount_source(&server, "b", 5).await);
    insert_source(&db, &source_a).await;
    insert_source(&db, &source_b).await;

    let job = app.use_case.trigger(trigger(&["A", "B"], 5)).await.unwrap();
    assert_eq!(job.status, JobStatus::New);

    let finished = wait_for_job(&app, job.id).await;
    assert_eq!(finished.status, JobStatus::Partial);
    assert_eq!(finished.total_saved, 5);
    assert_eq!(finished.total_extracted, 5);
    assert!(finished.completed_at.is_some());

    let details = app.use_case.get_job(job.id).await.unwrap();
    assert_eq!(details.source_results.len(), 2);

    let a = details
        .source_results
        .iter()
        .find(|o| o.source_id() == source_a.id)
        .unwrap();
    assert_eq!(a.verdict(), SourceVerdict::Failed);
    assert!(a.extraction.feed_error.is_some());
    assert_eq!(a.extraction.candidates_seen, 0);
    assert_eq!(a.extraction.extraction_successes, 0);
    assert_eq!(a.persistence.articles_saved, 0);

    let b = details
        .source_results
        .iter()
        .find(|o| o.source_id() == source_b.id)
        .unwrap();
    assert_eq!(b.verdict(), SourceVerdict::Succeeded);
    assert_eq!(b.extraction.extraction_successes, 5);
    assert_eq!(b.persistence.articles_saved, 5);

    let (stored, total) = app
        .content_repo
        .query(ContentQuery {
            job_id: Some(job.id),
            limit: 50,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert!(stored.iter().all(|r| r.source_id == source_b.id));
    for record in &stored {
        let payload = record.compressed_payload.as_deref().unwrap();
        assert_eq!(compression::decompress(payload).unwrap(), record.body);
    }

    app.shutdown().await;
}

#[tokio::test]
async fn test_retrigger_classifies_everything_as_duplicate() {
    let server = MockServer::start().await;
    let db = setup_db().await;
    let app = build_app(db.clone()).await;

    let source = test_source("Wire", mount_source(&server, "wire", 4).await);
    insert_source(&db, &source).await;

    let first = app.use_case.trigger(trigger(&["wire"], 10)).await.unwrap();
    let first = wait_for_job(&app, first.id).await;
    assert_eq!(first.status, JobStatus::Successful);
    assert_eq!(first.total_saved, 4);

    let second = app.use_case.trigger(trigger(&["Wire"], 10)).await.unwrap();
    let second = wait_for_job(&app, second.id).await;
    assert_eq!(second.status, JobStatus::Successful);
    assert_eq!(second.total_saved, 0);
    assert_eq!(second.total_duplicates, 4);
    assert_eq!(second.total_errors, 0);

    let details = app.use_case.get_job(second.id).await.unwrap();
    assert_eq!(details.source_results[0].verdict(), SourceVerdict::ZeroYield);

    let (_, total) = app
        .content_repo
        .query(ContentQuery {
            source_id: Some(source.id),
            limit: 50,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 4);

    app.shutdown().await;
}

#[tokio::test]
async fn test_teardown_fault_is_isolated() {
    let server = MockServer::start().await;
    let db = setup_db().await;

    let source_a = test_source("Alpha", mount_source(&server, "alpha", 2).await);
    let source_b = test_source("Beta", mount_source(&server, "beta", 2).await);
    insert_source(&db, &source_a).await;
    insert_source(&db, &source_b).await;

    let mut fetcher = FaultyFetcher::new();
    fetcher.failing_teardown = Some(source_a.id);
    let app = build_app_with(db.clone(), Arc::new(fetcher)).await;

    let job = app.use_case.trigger(trigger(&["alpha", "beta"], 2)).await.unwrap();
    let finished = wait_for_job(&app, job.id).await;
    assert_eq!(finished.status, JobStatus::Successful);
    assert_eq!(finished.total_saved, 4);
    // 清理故障计入错误数，但不影响判定
    assert_eq!(finished.total_errors, 1);

    let details = app.use_case.get_job(job.id).await.unwrap();
    let alpha = details
        .source_results
        .iter()
        .find(|o| o.source_id() == source_a.id)
        .unwrap();
    assert!(alpha.extraction.teardown_fault.is_some());
    assert_eq!(alpha.verdict(), SourceVerdict::Succeeded);

    let errors = app
        .use_case
        .job_logs(
            job.id,
            JobLogQueryDto {
                event_type: Some("error".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(errors
        .iter()
        .any(|e| e.payload["category"] == "teardown_fault" && e.source_id == Some(source_a.id)));

    app.shutdown().await;
}

#[tokio::test]
async fn test_panicking_source_does_not_abort_siblings() {
    let server = MockServer::start().await;
    let db = setup_db().await;

    let source_a = test_source("Crashy", mount_source(&server, "crashy", 2).await);
    let source_b = test_source("Steady", mount_source(&server, "steady", 3).await);
    insert_source(&db, &source_a).await;
    insert_source(&db, &source_b).await;

    let mut fetcher = FaultyFetcher::new();
    fetcher.panic_on = Some("/crashy/articles/");
    let app = build_app_with(db.clone(), Arc::new(fetcher)).await;

    let job = app.use_case.trigger(trigger(&["crashy", "steady"], 5)).await.unwrap();
    let finished = wait_for_job(&app, job.id).await;
    assert_eq!(finished.status, JobStatus::Partial);
    assert_eq!(finished.total_saved, 3);

    let details = app.use_case.get_job(job.id).await.unwrap();
    let crashy = details
        .source_results
        .iter()
        .find(|o| o.source_id() == source_a.id)
        .unwrap();
    assert!(crashy.extraction.fault.is_some());
    assert_eq!(crashy.verdict(), SourceVerdict::Failed);

    app.shutdown().await;
}

#[tokio::test]
async fn test_cancelled_job_keeps_saved_content() {
    let server = MockServer::start().await;
    let db = setup_db().await;
    let app = build_app(db.clone()).await;

    let items: Vec<(String, String)> = (0..6)
        .map(|i| (format!("slow {}", i), format!("/slow/articles/{}", i)))
        .collect();
    Mock::given(method("GET"))
        .and(path("/slow/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rss(&server.uri(), &items)))
        .mount(&server)
        .await;
    for (i, (title, _)) in items.iter().enumerate() {
        // 第一篇立即返回，其余足够慢，保证取消时已有内容落库
        let delay = if i == 0 { 0 } else { 1_000 };
        Mock::given(method("GET"))
            .and(path(format!("/slow/articles/{}", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(article_html(title, &format!("slow-{}", i)))
                    .set_delay(Duration::from_millis(delay)),
            )
            .mount(&server)
            .await;
    }
    let source = test_source("Slow", format!("{}/slow/feed.xml", server.uri()));
    insert_source(&db, &source).await;

    let job = app.use_case.trigger(trigger(&["slow"], 6)).await.unwrap();
    let by_job = || ContentQuery {
        job_id: Some(job.id),
        limit: 50,
        ..Default::default()
    };

    let mut saved_before_cancel = Vec::new();
    for _ in 0..100 {
        let (rows, _) = app.content_repo.query(by_job()).await.unwrap();
        if !rows.is_empty() {
            saved_before_cancel = rows;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(!saved_before_cancel.is_empty(), "first article was never saved");
    assert_eq!(app.use_case.cancel_job(job.id).await.unwrap(), CancelResult::Cancelling);

    let finished = wait_for_job(&app, job.id).await;
    assert_eq!(finished.status, JobStatus::Cancelled);
    assert!(finished.total_saved >= 1);
    assert!(finished.total_saved < 6);

    // 取消不回滚已保存的内容
    let (after, total) = app.content_repo.query(by_job()).await.unwrap();
    assert_eq!(total, finished.total_saved as u64);
    for record in &saved_before_cancel {
        assert!(after.iter().any(|r| r.id == record.id && r.source_url == record.source_url));
    }

    let details = app.use_case.get_job(job.id).await.unwrap();
    let outcome = &details.source_results[0];
    assert!(outcome.extraction.candidates_skipped > 0);

    // 已结束的任务不能再取消
    assert!(app.use_case.cancel_job(job.id).await.is_err());

    app.shutdown().await;
}

#[tokio::test]
async fn test_events_share_correlation_id_per_candidate() {
    let server = MockServer::start().await;
    let db = setup_db().await;
    let app = build_app(db.clone()).await;

    let source = test_source("Traced", mount_source(&server, "traced", 1).await);
    insert_source(&db, &source).await;

    let mut request = trigger(&["traced"], 1);
    request.enable_tracking = Some(true);
    let job = app.use_case.trigger(request).await.unwrap();
    wait_for_job(&app, job.id).await;

    let extracted = app
        .use_case
        .job_logs(
            job.id,
            JobLogQueryDto {
                event_type: Some("extraction".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(extracted.len(), 1);
    let correlation_id = extracted[0].correlation_id.expect("correlated");
    assert!(extracted[0].payload["traces"].is_array());

    let chain = app
        .use_case
        .job_logs(
            job.id,
            JobLogQueryDto {
                correlation_id: Some(correlation_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let types: Vec<EventType> = chain.iter().map(|e| e.event_type).collect();
    assert_eq!(
        types,
        vec![EventType::Http, EventType::Extraction, EventType::Persistence]
    );
    assert!(chain.iter().all(|e| e.source_id == Some(source.id)));

    // 全部日志按 (时间, 序号) 有序
    let all = app
        .use_case
        .job_logs(job.id, JobLogQueryDto::default())
        .await
        .unwrap();
    assert!(all
        .windows(2)
        .all(|w| (w[0].created_at, w[0].sequence) <= (w[1].created_at, w[1].sequence)));
    assert!(all.iter().any(|e| e.event_type == EventType::Lifecycle && e.severity == Severity::Info));

    app.shutdown().await;
}

#[tokio::test]
async fn test_thin_pages_count_as_extraction_failures() {
    let server = MockServer::start().await;
    let db = setup_db().await;
    let app = build_app(db.clone()).await;

    let items = vec![("Thin".to_string(), "/thin/articles/0".to_string())];
    Mock::given(method("GET"))
        .and(path("/thin/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rss(&server.uri(), &items)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/thin/articles/0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><article><p>Too short.</p></article></body></html>"),
        )
        .mount(&server)
        .await;
    let source = test_source("Thin", format!("{}/thin/feed.xml", server.uri()));
    insert_source(&db, &source).await;

    let job = app.use_case.trigger(trigger(&["thin"], 1)).await.unwrap();
    let finished = wait_for_job(&app, job.id).await;
    assert_eq!(finished.status, JobStatus::Failed);
    assert_eq!(finished.total_errors, 1);

    let failures = app
        .use_case
        .job_logs(
            job.id,
            JobLogQueryDto {
                event_type: Some("extraction".to_string()),
                severity: Some("warn".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].payload["reason"], "below_threshold");

    app.shutdown().await;
}

#[tokio::test]
async fn test_robots_disallowed_candidates_are_not_fetched() {
    let server = MockServer::start().await;
    let db = setup_db().await;
    let app = build_app(db.clone()).await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /guarded/articles/\n"),
        )
        .mount(&server)
        .await;
    let mut source = test_source("Guarded", mount_source(&server, "guarded", 2).await);
    source.policy.respect_robots = true;
    insert_source(&db, &source).await;

    let job = app.use_case.trigger(trigger(&["guarded"], 2)).await.unwrap();
    let finished = wait_for_job(&app, job.id).await;
    assert_eq!(finished.status, JobStatus::Failed);

    let details = app.use_case.get_job(job.id).await.unwrap();
    assert_eq!(details.source_results[0].extraction.extraction_failures, 2);

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(!requests
        .iter()
        .any(|r| r.url.path().starts_with("/guarded/articles/")));

    app.shutdown().await;
}
