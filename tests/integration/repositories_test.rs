// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::*;
use chrono::{Duration, Utc};
use newsrs::domain::models::article::{
    ExtractedArticle, ExtractionMethod, ProcessingStatus, ScrapedContentRecord,
};
use newsrs::domain::models::job::{JobStatus, ScrapingJob};
use newsrs::domain::models::job_event::{EventType, JobEvent, Severity};
use newsrs::domain::models::source_result::SourceOutcome;
use newsrs::domain::repositories::content_repository::{
    ContentQuery, ContentRepository, DuplicateKind, InsertOutcome,
};
use newsrs::domain::repositories::job_event_repository::{JobEventQuery, JobEventRepository};
use newsrs::domain::repositories::job_repository::{JobQueryParams, JobRepository, RepositoryError};
use newsrs::domain::repositories::source_repository::SourceRepository;
use newsrs::domain::services::deduplicator::fingerprint;
use newsrs::infrastructure::repositories::content_repo_impl::ContentRepositoryImpl;
use newsrs::infrastructure::repositories::job_event_repo_impl::JobEventRepositoryImpl;
use newsrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use newsrs::infrastructure::repositories::source_repo_impl::SourceRepositoryImpl;
use serde_json::json;
use uuid::Uuid;

fn article(url: &str, body: &str, language: Option<&str>) -> ExtractedArticle {
    ExtractedArticle {
        url: url.to_string(),
        title: format!("Title for {}", url),
        body: body.to_string(),
        author: Some("Reporter".to_string()),
        published_at: Some(Utc::now()),
        language: language.map(str::to_string),
        fingerprint: fingerprint(body),
        quality_score: 72,
        method: ExtractionMethod::SelectorCascade,
        traces: None,
    }
}

#[tokio::test]
async fn test_content_uniqueness_by_url_and_hash() {
    let db = setup_db().await;
    let source = test_source("Unique", "https://unique.example/feed".to_string());
    insert_source(&db, &source).await;
    let repo = ContentRepositoryImpl::new(db.clone());

    let first = ScrapedContentRecord::from_article(
        &article("https://unique.example/a", "Harbour reopens after storm", Some("en")),
        source.id,
        None,
        None,
    );
    let inserted = repo.insert_unique(&first).await.unwrap();
    assert!(matches!(inserted, InsertOutcome::Inserted(_)));

    // 相同 URL，不同正文
    let same_url = ScrapedContentRecord::from_article(
        &article("https://unique.example/a", "Completely different body", Some("en")),
        source.id,
        None,
        None,
    );
    assert!(matches!(
        repo.insert_unique(&same_url).await.unwrap(),
        InsertOutcome::Duplicate(DuplicateKind::Url)
    ));

    // 不同 URL，正文只有空白与大小写差异
    let same_body = ScrapedContentRecord::from_article(
        &article("https://unique.example/b", "  harbour   REOPENS after storm ", Some("en")),
        source.id,
        None,
        None,
    );
    assert!(matches!(
        repo.insert_unique(&same_body).await.unwrap(),
        InsertOutcome::Duplicate(DuplicateKind::ContentHash)
    ));

    assert!(repo.exists_by_url("https://unique.example/a").await.unwrap());
    assert!(!repo.exists_by_url("https://unique.example/b").await.unwrap());
    assert!(repo.exists_by_hash(&first.content_hash).await.unwrap());

    let (_, total) = repo
        .query(ContentQuery {
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn test_content_query_filters_and_status_update() {
    let db = setup_db().await;
    let source_a = test_source("Query A", "https://a.example/feed".to_string());
    let source_b = test_source("Query B", "https://b.example/feed".to_string());
    insert_source(&db, &source_a).await;
    insert_source(&db, &source_b).await;

    let jobs = JobRepositoryImpl::new(db.clone());
    let job = jobs
        .create(&ScrapingJob::new(vec![source_a.id], 5, false))
        .await
        .unwrap();

    let repo = ContentRepositoryImpl::new(db.clone());
    let records = [
        (source_a.id, Some(job.id), "https://a.example/1", "Budget vote delayed again", Some("en")),
        (source_a.id, None, "https://a.example/2", "Le budget est adopté", Some("fr")),
        (source_b.id, None, "https://b.example/1", "Transit budget grows", Some("en")),
    ];
    let mut ids = Vec::new();
    for (source_id, job_id, url, body, language) in records {
        let record =
            ScrapedContentRecord::from_article(&article(url, body, language), source_id, job_id, None);
        ids.push(record.id);
        repo.insert_unique(&record).await.unwrap();
    }

    let by_source = repo
        .query(ContentQuery {
            source_id: Some(source_a.id),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_source.1, 2);

    let by_language = repo
        .query(ContentQuery {
            language: Some("en".to_string()),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_language.1, 2);

    let by_job = repo
        .query(ContentQuery {
            job_id: Some(job.id),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_job.1, 1);
    assert_eq!(by_job.0[0].source_url, "https://a.example/1");

    let by_text = repo
        .query(ContentQuery {
            text: Some("Transit".to_string()),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_text.1, 1);
    assert_eq!(by_text.0[0].source_id, source_b.id);

    repo.update_processing_status(ids[0], ProcessingStatus::Processed)
        .await
        .unwrap();
    let processed = repo
        .query(ContentQuery {
            processing_status: Some(ProcessingStatus::Processed),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(processed.1, 1);
    let pending = repo.find_by_id(ids[1]).await.unwrap().unwrap();
    assert_eq!(pending.processing_status, ProcessingStatus::Pending);

    assert!(matches!(
        repo.update_processing_status(Uuid::new_v4(), ProcessingStatus::Archived)
            .await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_job_repository_rejects_updates_after_terminal_state() {
    let db = setup_db().await;
    let repo = JobRepositoryImpl::new(db.clone());

    let job = repo
        .create(&ScrapingJob::new(vec![Uuid::new_v4()], 3, true))
        .await
        .unwrap();
    let loaded = repo.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::New);
    assert!(loaded.enable_tracking);
    assert_eq!(loaded.source_ids, job.source_ids);

    let running = repo.update(&loaded.start().unwrap()).await.unwrap();
    assert_eq!(running.status, JobStatus::InProgress);

    let outcome = SourceOutcome::new(job.source_ids[0], "only");
    let failed = running.clone().complete(&[outcome]).unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    repo.update(&failed).await.unwrap();

    let late = running.cancel().unwrap();
    assert!(matches!(
        repo.update(&late).await,
        Err(RepositoryError::Conflict(_))
    ));

    let mut ghost = ScrapingJob::new(vec![], 1, false);
    ghost.status = JobStatus::InProgress;
    assert!(matches!(
        repo.update(&ghost).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_job_listing_filters_by_status() {
    let db = setup_db().await;
    let repo = JobRepositoryImpl::new(db.clone());

    for _ in 0..3 {
        repo.create(&ScrapingJob::new(vec![Uuid::new_v4()], 1, false))
            .await
            .unwrap();
    }
    let job = repo
        .create(&ScrapingJob::new(vec![Uuid::new_v4()], 1, false))
        .await
        .unwrap();
    repo.update(&job.cancel().unwrap()).await.unwrap();

    let (all, total) = repo
        .list(JobQueryParams {
            status: None,
            limit: 2,
            offset: 0,
        })
        .await
        .unwrap();
    assert_eq!(total, 4);
    assert_eq!(all.len(), 2);

    let (cancelled, total) = repo
        .list(JobQueryParams {
            status: Some(JobStatus::Cancelled),
            limit: 10,
            offset: 0,
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(cancelled[0].status, JobStatus::Cancelled);
}

#[tokio::test]
async fn test_job_events_are_ordered_and_filterable() {
    let db = setup_db().await;
    let jobs = JobRepositoryImpl::new(db.clone());
    let job = jobs
        .create(&ScrapingJob::new(vec![Uuid::new_v4()], 1, false))
        .await
        .unwrap();
    let repo = JobEventRepositoryImpl::new(db.clone());

    let source_id = Uuid::new_v4();
    let correlation = Uuid::new_v4();
    let base = Utc::now();
    let mut events = vec![
        JobEvent::new(job.id, Severity::Info, EventType::Lifecycle, "started"),
        JobEvent::new(job.id, Severity::Info, EventType::Http, "fetched")
            .with_source(source_id)
            .with_correlation(correlation),
        JobEvent::new(job.id, Severity::Warning, EventType::Extraction, "failed")
            .with_source(source_id)
            .with_correlation(correlation)
            .with_payload(json!({ "reason": "below_threshold" })),
        JobEvent::new(job.id, Severity::Info, EventType::Lifecycle, "finished"),
    ];
    // 乱序写入，读取时按 (时间, 序号) 排序
    for (i, event) in events.iter_mut().enumerate() {
        event.created_at = base + Duration::milliseconds(i as i64);
        event.sequence = i as i64;
    }
    events.reverse();
    repo.append(&events).await.unwrap();
    repo.append(&[]).await.unwrap();

    let all = repo.query(JobEventQuery::for_job(job.id)).await.unwrap();
    let messages: Vec<&str> = all.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["started", "fetched", "failed", "finished"]);

    let mut by_correlation = JobEventQuery::for_job(job.id);
    by_correlation.correlation_id = Some(correlation);
    let chain = repo.query(by_correlation).await.unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[1].payload["reason"], "below_threshold");
    assert_eq!(
        chain[1].payload["correlation_id"],
        json!(correlation.to_string())
    );

    let mut warnings = JobEventQuery::for_job(job.id);
    warnings.severity = Some(Severity::Warning);
    assert_eq!(repo.query(warnings).await.unwrap().len(), 1);

    let mut limited = JobEventQuery::for_job(job.id);
    limited.event_type = Some(EventType::Lifecycle);
    limited.limit = Some(1);
    let first = repo.query(limited).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].message, "started");
}

#[tokio::test]
async fn test_source_repository_returns_only_active_sources() {
    let db = setup_db().await;
    let mut inactive = test_source("Dormant", "https://dormant.example/feed".to_string());
    inactive.is_active = false;
    let mut active = test_source("Live", "https://live.example/feed".to_string());
    active.content_selectors = vec![".story".to_string()];
    insert_source(&db, &inactive).await;
    insert_source(&db, &active).await;

    let repo = SourceRepositoryImpl::new(db.clone());
    let sources = repo.find_active().await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].id, active.id);
    assert_eq!(sources[0].content_selectors, vec![".story".to_string()]);
    assert!(!sources[0].policy.respect_robots);

    let dormant = repo.find_by_id(inactive.id).await.unwrap().unwrap();
    assert!(!dormant.is_active);
}
