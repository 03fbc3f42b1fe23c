// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use migration::{Migrator, MigratorTrait};
use newsrs::app::App;
use newsrs::config::settings::{
    DatabaseSettings, MetricsSettings, ScraperSettings, ServerSettings, Settings,
};
use newsrs::domain::models::job::ScrapingJob;
use newsrs::domain::models::source::{PolitenessPolicy, Source};
use newsrs::domain::services::extraction::QualityWeights;
use newsrs::engines::reqwest_engine::ReqwestEngine;
use newsrs::engines::traits::PageFetcher;
use newsrs::infrastructure::database::connection;
use newsrs::infrastructure::repositories::source_repo_impl::SourceRepositoryImpl;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn test_settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: None,
            min_connections: None,
            connect_timeout: Some(30),
            idle_timeout: None,
            sql_logging: false,
        },
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        scraper: ScraperSettings {
            feed_retries: 1,
            snapshot_interval_secs: 3600,
            ..Default::default()
        },
        quality: QualityWeights::default(),
        metrics: MetricsSettings {
            enabled: false,
            ..Default::default()
        },
    }
}

/// 内存数据库并执行迁移
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let db = connection::create_pool(&test_settings().database)
        .await
        .expect("sqlite connection");
    Migrator::up(&db, None).await.expect("migrations");
    Arc::new(db)
}

pub async fn build_app(db: Arc<DatabaseConnection>) -> App {
    let fetcher: Arc<dyn PageFetcher> = Arc::new(ReqwestEngine::new().expect("http client"));
    App::build(&test_settings(), db, fetcher)
}

pub async fn build_app_with(db: Arc<DatabaseConnection>, fetcher: Arc<dyn PageFetcher>) -> App {
    App::build(&test_settings(), db, fetcher)
}

/// 不遵守 robots、无延迟的测试源
pub fn test_source(name: &str, feed_url: String) -> Source {
    let mut source = Source::new(name, "127.0.0.1", feed_url);
    source.policy = PolitenessPolicy {
        respect_robots: false,
        delay_ms: 0,
        user_agent: "newsrs-test".to_string(),
        timeout_ms: 5_000,
    };
    source
}

pub async fn insert_source(db: &Arc<DatabaseConnection>, source: &Source) {
    SourceRepositoryImpl::new(db.clone())
        .insert(source)
        .await
        .expect("insert source");
}

pub fn rss(base: &str, items: &[(String, String)]) -> String {
    let entries: String = items
        .iter()
        .map(|(title, link)| {
            format!(
                "<item><title>{}</title><link>{}{}</link><pubDate>Mon, 03 Mar 2025 10:00:00 GMT</pubDate></item>",
                title, base, link
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Test feed</title><link>{}</link><description>test</description>{}</channel></rss>"#,
        base, entries
    )
}

/// 一篇足够长的文章页面，正文随 `seed` 变化以得到不同指纹
pub fn article_html(title: &str, seed: &str) -> String {
    let paragraphs: String = (0..4)
        .map(|i| {
            format!(
                "<p>Paragraph {} of the report on {}. City officials confirmed on Tuesday that the \
                 new transit line will open ahead of schedule, citing strong ridership forecasts.</p>",
                i, seed
            )
        })
        .collect();
    format!(
        r#"<html lang="en"><head><title>{title}</title></head><body><article><h1>{title}</h1>{paragraphs}</article></body></html>"#
    )
}

/// 为一个源挂载 feed 与 `count` 篇文章，返回 feed 地址
pub async fn mount_source(server: &MockServer, prefix: &str, count: usize) -> String {
    let items: Vec<(String, String)> = (0..count)
        .map(|i| (format!("{} story {}", prefix, i), format!("/{}/articles/{}", prefix, i)))
        .collect();

    Mock::given(method("GET"))
        .and(path(format!("/{}/feed.xml", prefix)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(rss(&server.uri(), &items)),
        )
        .mount(server)
        .await;

    for (i, (title, _)) in items.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(format!("/{}/articles/{}", prefix, i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(article_html(title, &format!("{}-{}", prefix, i))),
            )
            .mount(server)
            .await;
    }

    format!("{}/{}/feed.xml", server.uri(), prefix)
}

/// 等待任务结束并写完事件，返回最新任务记录
pub async fn wait_for_job(app: &App, job_id: uuid::Uuid) -> ScrapingJob {
    app.manager.wait(job_id).await;
    app.logger.flush().await;
    app.job_repo
        .find_by_id(job_id)
        .await
        .expect("job lookup")
        .expect("job exists")
}
