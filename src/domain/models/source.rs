// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// 默认抓取 User-Agent
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; newsrs/1.0; +https://newsrs.dev/bot)";

/// 礼貌抓取策略
///
/// 每个内容源各自配置的访问约束：是否遵守 robots.txt、
/// 请求间隔、User-Agent 以及单次请求超时。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolitenessPolicy {
    /// 是否遵守 robots.txt
    pub respect_robots: bool,
    /// 两次请求之间的最小间隔（毫秒）
    pub delay_ms: u64,
    /// 请求使用的 User-Agent
    pub user_agent: String,
    /// 单次请求超时（毫秒）
    pub timeout_ms: u64,
}

impl Default for PolitenessPolicy {
    fn default() -> Self {
        Self {
            respect_robots: true,
            delay_ms: 1000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl PolitenessPolicy {
    /// 请求超时
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// 请求间隔
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// 内容源实体
///
/// 由外部的源管理服务创建和维护，本引擎只读取处于激活状态的源。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// 源唯一标识符
    pub id: Uuid,
    /// 显示名称
    pub name: String,
    /// 站点域名
    pub domain: String,
    /// Feed 地址（RSS/Atom）
    pub feed_url: String,
    /// 礼貌抓取策略
    pub policy: PolitenessPolicy,
    /// 源专属的正文选择器，优先于通用选择器尝试
    pub content_selectors: Vec<String>,
    /// 是否激活
    pub is_active: bool,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl Source {
    /// 创建一个使用默认礼貌策略的激活源
    pub fn new(name: impl Into<String>, domain: impl Into<String>, feed_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            domain: domain.into(),
            feed_url: feed_url.into(),
            policy: PolitenessPolicy::default(),
            content_selectors: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// 判断触发请求中的标识符是否指向本源（ID 或名称，名称不区分大小写）
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        match Uuid::parse_str(identifier) {
            Ok(id) => id == self.id,
            Err(_) => self.name.eq_ignore_ascii_case(identifier),
        }
    }

    /// 用全局默认值补齐未配置的策略字段
    pub fn with_policy_fallbacks(mut self, defaults: &PolitenessPolicy) -> Self {
        if self.policy.user_agent.trim().is_empty() {
            self.policy.user_agent = defaults.user_agent.clone();
        }
        if self.policy.timeout_ms == 0 {
            self.policy.timeout_ms = defaults.timeout_ms;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_identifier_by_id_and_name() {
        let source = Source::new("Daily Planet", "dailyplanet.com", "https://dailyplanet.com/rss");

        assert!(source.matches_identifier(&source.id.to_string()));
        assert!(source.matches_identifier("daily planet"));
        assert!(source.matches_identifier("  Daily Planet "));
        assert!(!source.matches_identifier("Daily Bugle"));
        assert!(!source.matches_identifier(&Uuid::new_v4().to_string()));
    }

    #[test]
    fn test_policy_fallbacks_fill_only_missing_fields() {
        let mut source = Source::new("Wire", "wire.example", "https://wire.example/feed");
        source.policy.user_agent = String::new();
        source.policy.timeout_ms = 0;
        source.policy.delay_ms = 50;

        let defaults = PolitenessPolicy {
            user_agent: "fallback-agent".to_string(),
            timeout_ms: 1234,
            delay_ms: 9999,
            respect_robots: false,
        };
        let source = source.with_policy_fallbacks(&defaults);
        assert_eq!(source.policy.user_agent, "fallback-agent");
        assert_eq!(source.policy.timeout_ms, 1234);
        assert_eq!(source.policy.delay_ms, 50);
        assert!(source.policy.respect_robots);
    }

    #[test]
    fn test_policy_durations() {
        let policy = PolitenessPolicy {
            delay_ms: 250,
            timeout_ms: 5000,
            ..Default::default()
        };
        assert_eq!(policy.delay(), Duration::from_millis(250));
        assert_eq!(policy.timeout(), Duration::from_secs(5));
    }
}
