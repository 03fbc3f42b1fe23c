// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::source_result::{JobTotals, SourceOutcome, SourceVerdict};

/// 抓取任务状态
///
/// 状态转换遵循以下流程：
/// New → InProgress → Successful/Partial/Failed
///
/// 任意非终态都可以被外部请求转为 Cancelled。终态一旦写入不再改变。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    /// 已创建
    #[default]
    New,
    /// 执行中
    InProgress,
    /// 全部源成功
    Successful,
    /// 部分源成功
    Partial,
    /// 全部源失败
    Failed,
    /// 已取消
    Cancelled,
}

impl JobStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Successful | JobStatus::Partial | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// 根据各源结果推导任务终态
    ///
    /// 源结果的完成顺序不影响推导结果。
    pub fn derive(outcomes: &[SourceOutcome]) -> JobStatus {
        if outcomes.is_empty() {
            return JobStatus::Failed;
        }

        let verdicts: Vec<SourceVerdict> = outcomes.iter().map(SourceOutcome::verdict).collect();
        let failed = verdicts
            .iter()
            .filter(|v| **v == SourceVerdict::Failed)
            .count();
        let degraded = verdicts
            .iter()
            .filter(|v| **v == SourceVerdict::Degraded)
            .count();

        if failed == verdicts.len() {
            JobStatus::Failed
        } else if failed == 0 && degraded == 0 {
            JobStatus::Successful
        } else {
            JobStatus::Partial
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::New => write!(f, "new"),
            JobStatus::InProgress => write!(f, "in-progress"),
            JobStatus::Successful => write!(f, "successful"),
            JobStatus::Partial => write!(f, "partial"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(JobStatus::New),
            "in-progress" => Ok(JobStatus::InProgress),
            "successful" => Ok(JobStatus::Successful),
            "partial" => Ok(JobStatus::Partial),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: JobStatus, to: JobStatus },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// 抓取任务实体
///
/// 只有任务编排器会修改任务；进入终态后任务不可变。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapingJob {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 任务状态
    pub status: JobStatus,
    /// 请求抓取的源
    pub source_ids: Vec<Uuid>,
    /// 每个源的目标文章数
    pub articles_per_source: u32,
    /// 是否记录选择器轨迹
    pub enable_tracking: bool,
    /// 抽取成功总数
    pub total_extracted: u32,
    /// 保存成功总数
    pub total_saved: u32,
    /// 重复跳过总数
    pub total_duplicates: u32,
    /// 错误总数
    pub total_errors: u32,
    /// 编排器级别故障描述
    pub error_message: Option<String>,
    /// 触发时间
    pub triggered_at: DateTime<Utc>,
    /// 开始执行时间
    pub started_at: Option<DateTime<Utc>>,
    /// 完成时间
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScrapingJob {
    /// 创建新任务
    pub fn new(source_ids: Vec<Uuid>, articles_per_source: u32, enable_tracking: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::New,
            source_ids,
            articles_per_source,
            enable_tracking,
            total_extracted: 0,
            total_saved: 0,
            total_duplicates: 0,
            total_errors: 0,
            error_message: None,
            triggered_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// 启动任务：New → InProgress
    pub fn start(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::New => {
                self.status = JobStatus::InProgress;
                self.started_at = Some(Utc::now());
                Ok(self)
            }
            from => Err(DomainError::InvalidStateTransition {
                from,
                to: JobStatus::InProgress,
            }),
        }
    }

    /// 完成任务：InProgress → 由源结果推导出的终态
    pub fn complete(mut self, outcomes: &[SourceOutcome]) -> Result<Self, DomainError> {
        let to = JobStatus::derive(outcomes);
        match self.status {
            JobStatus::InProgress => {
                self.apply_totals(JobTotals::fold(outcomes));
                self.status = to;
                self.completed_at = Some(Utc::now());
                Ok(self)
            }
            from => Err(DomainError::InvalidStateTransition { from, to }),
        }
    }

    /// 编排器级别故障：任意非终态 → Failed
    pub fn fail(mut self, reason: impl Into<String>) -> Result<Self, DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: JobStatus::Failed,
            });
        }
        self.status = JobStatus::Failed;
        self.error_message = Some(reason.into());
        self.completed_at = Some(Utc::now());
        Ok(self)
    }

    /// 取消任务：New/InProgress → Cancelled
    pub fn cancel(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::New | JobStatus::InProgress => {
                self.status = JobStatus::Cancelled;
                self.completed_at = Some(Utc::now());
                Ok(self)
            }
            from => Err(DomainError::InvalidStateTransition {
                from,
                to: JobStatus::Cancelled,
            }),
        }
    }

    /// 写入汇总计数，用于已取消任务在收尾时保留统计
    pub fn apply_totals(&mut self, totals: JobTotals) {
        self.total_extracted = totals.total_extracted;
        self.total_saved = totals.total_saved;
        self.total_duplicates = totals.total_duplicates;
        self.total_errors = totals.total_errors;
    }

    /// 任务耗时（毫秒），未开始时为 None
    pub fn duration_ms(&self) -> Option<i64> {
        let started = self.started_at?;
        let finished = self.completed_at.unwrap_or_else(Utc::now);
        Some((finished - started).num_milliseconds().max(0))
    }
}
