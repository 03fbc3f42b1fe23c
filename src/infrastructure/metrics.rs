// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// 启动 Prometheus 导出器并注册指标说明
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::warn!("Invalid metrics address '{}': {}", settings.listen_addr, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!("articles_extracted_total", "Articles that passed the extraction cascade");
    describe_counter!("articles_saved_total", "Articles durably saved to the content store");
    describe_counter!("articles_duplicate_total", "Articles skipped as URL or content duplicates");
    describe_counter!("save_failures_total", "Article saves that failed");
    describe_counter!("extraction_failures_total", "Candidates that yielded no usable content");
    describe_gauge!("jobs_active", "Scraping jobs currently running");
    describe_gauge!("fetch_in_flight", "Page fetches currently in flight");
}
