// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::*;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::MockServer;

#[tokio::test]
async fn test_health_and_version() {
    let db = setup_db().await;
    let app = build_app(db).await;
    let server = TestServer::new(app.router()).unwrap();

    let health = server.get("/health").await;
    health.assert_status_ok();
    health.assert_text("OK");

    let version: Value = server.get("/v1/version").await.json();
    assert_eq!(version["name"], "newsrs");
    assert!(version["version"].is_string());
}

#[tokio::test]
async fn test_trigger_rejects_malformed_input() {
    let db = setup_db().await;
    let source = test_source("Known", "https://known.example/feed".to_string());
    insert_source(&db, &source).await;
    let app = build_app(db).await;
    let server = TestServer::new(app.router()).unwrap();

    let empty = server
        .post("/v1/jobs")
        .json(&json!({ "sources": [], "articlesPerSource": 5 }))
        .await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);

    let out_of_range = server
        .post("/v1/jobs")
        .json(&json!({ "sources": ["Known"], "articlesPerSource": 1001 }))
        .await;
    assert_eq!(out_of_range.status_code(), StatusCode::BAD_REQUEST);

    let missing_field = server
        .post("/v1/jobs")
        .json(&json!({ "sources": ["Known"] }))
        .await;
    assert_eq!(missing_field.status_code(), StatusCode::BAD_REQUEST);

    let unknown = server
        .post("/v1/jobs")
        .json(&json!({ "sources": ["Known", "Nowhere"], "articlesPerSource": 5 }))
        .await;
    assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = unknown.json();
    assert!(body["error"].as_str().unwrap().contains("Nowhere"));

    let (_, total) = app
        .job_repo
        .list(newsrs::domain::repositories::job_repository::JobQueryParams {
            status: None,
            limit: 10,
            offset: 0,
        })
        .await
        .unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_trigger_then_poll_job_logs_and_content() {
    let mock = MockServer::start().await;
    let db = setup_db().await;
    let source = test_source("Herald", mount_source(&mock, "herald", 3).await);
    insert_source(&db, &source).await;
    let app = build_app(db).await;
    let server = TestServer::new(app.router()).unwrap();

    let sources: Value = server.get("/v1/sources").await.json();
    assert_eq!(sources.as_array().unwrap().len(), 1);
    assert_eq!(sources[0]["name"], "Herald");

    let response = server
        .post("/v1/jobs")
        .json(&json!({ "sources": ["herald"], "articlesPerSource": 3, "enableTracking": true }))
        .await;
    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["status"], "started");
    let job_id: Uuid = body["jobId"].as_str().unwrap().parse().unwrap();

    wait_for_job(&app, job_id).await;

    let job: Value = server.get(&format!("/v1/jobs/{}", job_id)).await.json();
    assert_eq!(job["status"], "successful");
    assert_eq!(job["totalSaved"], 3);
    assert!(job["durationMs"].is_number());
    assert_eq!(job["sourceResults"][0]["saved"], 3);
    assert_eq!(job["sourceResults"][0]["extracted"], 3);
    assert_eq!(job["sourceResults"][0]["verdict"], "succeeded");

    let logs = server
        .get(&format!("/v1/jobs/{}/logs", job_id))
        .add_query_param("event_type", "persistence")
        .await;
    logs.assert_status_ok();
    let logs: Value = logs.json();
    assert_eq!(logs["total"], 3);
    assert!(logs["events"]
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["event_type"] == "persistence" && e["correlation_id"].is_string()));

    let bad_filter = server
        .get(&format!("/v1/jobs/{}/logs", job_id))
        .add_query_param("severity", "loud")
        .await;
    assert_eq!(bad_filter.status_code(), StatusCode::BAD_REQUEST);

    let content: Value = server
        .get("/v1/content")
        .add_query_param("job_id", job_id)
        .add_query_param("language", "en")
        .await
        .json();
    assert_eq!(content["total"], 3);
    let first = &content["items"][0];
    assert!(first.get("compressed_payload").is_none());
    assert_eq!(first["processing_status"], "pending");

    let content_id = first["id"].as_str().unwrap();
    server
        .get(&format!("/v1/content/{}", content_id))
        .await
        .assert_status_ok();

    let searched: Value = server
        .get("/v1/content")
        .add_query_param("q", "herald story 1")
        .await
        .json();
    assert_eq!(searched["total"], 1);

    let listed: Value = server.get("/v1/jobs").await.json();
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["hasMore"], false);

    let late_cancel = server.post(&format!("/v1/jobs/{}/cancel", job_id)).await;
    assert_eq!(late_cancel.status_code(), StatusCode::CONFLICT);

    app.shutdown().await;
}

#[tokio::test]
async fn test_unknown_job_returns_not_found() {
    let db = setup_db().await;
    let app = build_app(db).await;
    let server = TestServer::new(app.router()).unwrap();

    let missing = server.get(&format!("/v1/jobs/{}", Uuid::new_v4())).await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

    let logs = server
        .get(&format!("/v1/jobs/{}/logs", Uuid::new_v4()))
        .await;
    assert_eq!(logs.status_code(), StatusCode::NOT_FOUND);

    let cancel = server
        .post(&format!("/v1/jobs/{}/cancel", Uuid::new_v4()))
        .await;
    assert_eq!(cancel.status_code(), StatusCode::NOT_FOUND);
}
