// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 事件严重级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Debug => write!(f, "debug"),
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// 任务/源的生命周期
    Lifecycle,
    /// 内容抽取
    Extraction,
    /// 持久化
    Persistence,
    /// 网络请求
    Http,
    /// 进程资源快照
    Performance,
    /// 错误
    Error,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventType::Lifecycle => write!(f, "lifecycle"),
            EventType::Extraction => write!(f, "extraction"),
            EventType::Persistence => write!(f, "persistence"),
            EventType::Http => write!(f, "http"),
            EventType::Performance => write!(f, "performance"),
            EventType::Error => write!(f, "error"),
        }
    }
}

impl FromStr for EventType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lifecycle" => Ok(EventType::Lifecycle),
            "extraction" => Ok(EventType::Extraction),
            "persistence" => Ok(EventType::Persistence),
            "http" => Ok(EventType::Http),
            "performance" => Ok(EventType::Performance),
            "error" => Ok(EventType::Error),
            _ => Err(()),
        }
    }
}

/// 任务事件
///
/// 追加写入、不可变。同一因果链上的事件共享 `correlation_id`，
/// 读取方据此还原链路，而不是依赖时间戳相近。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    pub id: Uuid,
    pub job_id: Uuid,
    pub source_id: Option<Uuid>,
    pub severity: Severity,
    pub event_type: EventType,
    pub message: String,
    /// 结构化负载，存在关联 ID 时同样写入 `correlation_id` 键
    pub payload: Value,
    pub correlation_id: Option<Uuid>,
    /// 进程内单调递增的写入序号，时间戳相同时用于排序
    pub sequence: i64,
    pub created_at: DateTime<Utc>,
}

impl JobEvent {
    pub fn new(
        job_id: Uuid,
        severity: Severity,
        event_type: EventType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            source_id: None,
            severity,
            event_type,
            message: message.into(),
            payload: Value::Object(Default::default()),
            correlation_id: None,
            sequence: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_source(mut self, source_id: Uuid) -> Self {
        self.source_id = Some(source_id);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self.sync_correlation();
        self
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self.sync_correlation();
        self
    }

    /// 负载不是对象时会被包进 `data` 键
    fn sync_correlation(&mut self) {
        let Some(correlation_id) = self.correlation_id else {
            return;
        };
        if !self.payload.is_object() {
            let data = std::mem::take(&mut self.payload);
            self.payload = serde_json::json!({ "data": data });
        }
        if let Value::Object(map) = &mut self.payload {
            map.insert(
                "correlation_id".to_string(),
                Value::String(correlation_id.to_string()),
            );
        }
    }
}
