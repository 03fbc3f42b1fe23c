// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::job_use_case::JobUseCase;
use crate::presentation::handlers::{content_handler, job_handler, source_handler};
use axum::{
    extract::Extension,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 参数
///
/// * `use_case` - 任务用例，通过 Extension 注入各处理器
///
/// # 返回值
///
/// 返回配置好的路由
/// 无需用例即可响应的路由
fn public_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version))
}

pub fn routes(use_case: Arc<JobUseCase>) -> Router {

    let api_routes = Router::new()
        .route(
            "/v1/jobs",
            post(job_handler::trigger_job).get(job_handler::list_jobs),
        )
        .route("/v1/jobs/{id}", get(job_handler::get_job))
        .route("/v1/jobs/{id}/logs", get(job_handler::get_job_logs))
        .route("/v1/jobs/{id}/cancel", post(job_handler::cancel_job))
        .route("/v1/sources", get(source_handler::list_sources))
        .route("/v1/content", get(content_handler::list_content))
        .route("/v1/content/{id}", get(content_handler::get_content))
        .layer(Extension(use_case));

    Router::new()
        .merge(public_routes())
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
