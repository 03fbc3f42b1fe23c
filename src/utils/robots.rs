// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use parking_lot::Mutex;
use robotstxt::DefaultMatcher;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use async_trait::async_trait;

use crate::engines::traits::{FetchRequest, PageFetcher};
use crate::utils::retry_policy::RetryPolicy;

const CACHE_TTL: Duration = Duration::from_secs(3600);
const ROBOTS_TIMEOUT: Duration = Duration::from_secs(5);

/// Robots.txt检查器接口
#[async_trait]
pub trait RobotsCheckerTrait: Send + Sync {
    /// 检查URL是否被允许访问
    async fn is_allowed(&self, url_str: &str, user_agent: &str) -> Result<bool>;
    /// 获取爬取延迟
    async fn get_crawl_delay(&self, url_str: &str, user_agent: &str) -> Result<Option<Duration>>;
}

/// 缓存的Robots.txt内容
#[derive(Clone)]
struct CachedRobots {
    /// 内容
    content: Arc<String>,

    /// 过期时间
    expires_at: Instant,
}

/// Robots.txt检查器
///
/// 通过抓取引擎获取 robots.txt 并在内存中缓存一小时。
/// 获取失败或返回 4xx 时视为允许全部。
#[derive(Clone)]
pub struct RobotsChecker {
    fetcher: Arc<dyn PageFetcher>,

    /// 内存缓存
    memory_cache: Arc<Mutex<HashMap<String, CachedRobots>>>,

    /// 重试策略
    retry_policy: RetryPolicy,
}

#[async_trait]
impl RobotsCheckerTrait for RobotsChecker {
    async fn is_allowed(&self, url_str: &str, user_agent: &str) -> Result<bool> {
        let content = self.get_robots_content(url_str, user_agent).await?;
        let url = Url::parse(url_str)?;
        let mut matcher = DefaultMatcher::default();
        Ok(matcher.one_agent_allowed_by_robots(&content, user_agent, url.as_str()))
    }

    async fn get_crawl_delay(&self, url_str: &str, user_agent: &str) -> Result<Option<Duration>> {
        let content = self.get_robots_content(url_str, user_agent).await?;
        Ok(parse_crawl_delay(&content, user_agent))
    }
}

impl RobotsChecker {
    /// 创建新的Robots检查器实例
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            memory_cache: Arc::new(Mutex::new(HashMap::new())),
            retry_policy: RetryPolicy {
                max_retries: 3,
                initial_backoff: Duration::from_millis(500),
                max_backoff: Duration::from_secs(5),
                ..Default::default()
            },
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// 获取Robots.txt内容（带缓存）
    async fn get_robots_content(&self, url_str: &str, user_agent: &str) -> Result<Arc<String>> {
        let url = Url::parse(url_str)?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid URL"))?;
        let scheme = url.scheme();
        let port = url.port_or_known_default().unwrap_or(80);

        let robots_url = format!("{}://{}:{}/robots.txt", scheme, host, port);

        {
            let mut cache = self.memory_cache.lock();
            if let Some(cached) = cache.get(&robots_url) {
                if cached.expires_at > Instant::now() {
                    return Ok(cached.content.clone());
                }
                cache.remove(&robots_url);
            }
        }

        let content = Arc::new(self.fetch_with_retry(&robots_url, user_agent).await);

        self.memory_cache.lock().insert(
            robots_url,
            CachedRobots {
                content: content.clone(),
                expires_at: Instant::now() + CACHE_TTL,
            },
        );

        Ok(content)
    }

    async fn fetch_with_retry(&self, robots_url: &str, user_agent: &str) -> String {
        let request = FetchRequest::new(robots_url, user_agent, ROBOTS_TIMEOUT);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match self.fetcher.fetch(&request).await {
                Ok(resp) if resp.is_success() => return resp.content,
                // 4xx 表示没有可用的 robots.txt
                Ok(resp) if resp.status_code < 500 => return String::new(),
                Ok(resp) => anyhow::anyhow!("Server error: {}", resp.status_code),
                Err(e) if e.is_retryable() => anyhow::anyhow!("Request failed: {}", e),
                Err(e) => {
                    tracing::warn!("Failed to fetch robots.txt from {}: {}", robots_url, e);
                    return String::new();
                }
            };

            if !self.retry_policy.should_retry(attempt) {
                tracing::warn!("Failed to fetch robots.txt from {}: {}", robots_url, error);
                return String::new();
            }
            tokio::time::sleep(self.retry_policy.calculate_backoff(attempt)).await;
        }
    }
}

/// 解析Crawl-delay指令
///
/// 优先使用匹配 User-Agent 的块，否则使用 `*` 块。
pub fn parse_crawl_delay(content: &str, user_agent: &str) -> Option<Duration> {
    let mut current_agent_matched = false;
    let mut delay: Option<f64> = None;
    let mut specific_agent_found = false;
    let user_agent = user_agent.to_lowercase();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.split('#').next().unwrap_or_default().trim();

        if key == "user-agent" {
            if value == "*" {
                current_agent_matched = !specific_agent_found;
            } else if user_agent.contains(&value.to_lowercase()) {
                current_agent_matched = true;
                if !specific_agent_found {
                    delay = None;
                }
                specific_agent_found = true;
            } else {
                current_agent_matched = false;
            }
        } else if key == "crawl-delay" && current_agent_matched {
            if let Ok(d) = value.parse::<f64>() {
                if d.is_finite() && d >= 0.0 {
                    delay = Some(d);
                }
            }
        }
    }

    delay.map(Duration::from_secs_f64)
}
