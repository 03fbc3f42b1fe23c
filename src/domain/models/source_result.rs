// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 单个源的抽取阶段统计
///
/// 只描述"内容是否被抽取出来"，与持久化结果分开记录。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceResult {
    pub source_id: Uuid,
    pub source_name: String,
    /// Feed 中读取到的候选数量
    pub candidates_seen: u32,
    /// 实际发起抽取的次数
    pub extraction_attempts: u32,
    /// 抽取成功次数
    pub extraction_successes: u32,
    /// 抽取失败次数（低于阈值、超时、robots 拒绝等）
    pub extraction_failures: u32,
    /// 因任务取消而未处理的候选数量
    pub candidates_skipped: u32,
    /// Feed 不可用时的错误描述
    pub feed_error: Option<String>,
    /// 源处理过程中的未处理故障
    pub fault: Option<String>,
    /// 抓取引擎清理阶段的故障，不影响该源的结果判定
    pub teardown_fault: Option<String>,
}

/// 单个源的持久化阶段统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePersistenceResult {
    pub source_id: Uuid,
    /// 成功保存的文章数
    pub articles_saved: u32,
    /// 因 URL 重复而跳过的数量
    pub duplicate_urls: u32,
    /// 因内容指纹重复而跳过的数量
    pub duplicate_content: u32,
    /// 保存失败数
    pub save_failures: u32,
}

impl SourcePersistenceResult {
    /// 重复内容总数
    pub fn duplicates_skipped(&self) -> u32 {
        self.duplicate_urls + self.duplicate_content
    }
}

/// 源结果判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceVerdict {
    /// 至少保存一篇且没有保存失败
    Succeeded,
    /// 没有新内容，但全部候选都是已见内容
    ZeroYield,
    /// 有保存成功也有保存失败
    Degraded,
    /// 没有任何内容被保存（Feed 不可用、全部抽取失败、全部保存失败或源故障）
    Failed,
}

/// 单个源在一次任务中的完整结果（两阶段统计）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub extraction: SourceResult,
    pub persistence: SourcePersistenceResult,
}

impl SourceOutcome {
    pub fn new(source_id: Uuid, source_name: impl Into<String>) -> Self {
        Self {
            extraction: SourceResult {
                source_id,
                source_name: source_name.into(),
                ..Default::default()
            },
            persistence: SourcePersistenceResult {
                source_id,
                ..Default::default()
            },
        }
    }

    /// 源处理过程中发生未处理故障时的结果，所有计数归零
    pub fn faulted(source_id: Uuid, source_name: impl Into<String>, fault: impl Into<String>) -> Self {
        let mut outcome = Self::new(source_id, source_name);
        outcome.extraction.fault = Some(fault.into());
        outcome
    }

    pub fn source_id(&self) -> Uuid {
        self.extraction.source_id
    }

    /// 根据两阶段统计判定源结果
    pub fn verdict(&self) -> SourceVerdict {
        let saved = self.persistence.articles_saved;
        let failures = self.persistence.save_failures;

        if self.extraction.fault.is_some() && saved == 0 {
            return SourceVerdict::Failed;
        }

        if saved > 0 {
            if failures == 0 {
                SourceVerdict::Succeeded
            } else {
                SourceVerdict::Degraded
            }
        } else if self.persistence.duplicates_skipped() > 0 && failures == 0 {
            SourceVerdict::ZeroYield
        } else {
            SourceVerdict::Failed
        }
    }

    /// 本源计入任务错误总数的数量
    pub fn error_count(&self) -> u32 {
        let mut errors = self.extraction.extraction_failures + self.persistence.save_failures;
        if self.extraction.feed_error.is_some() {
            errors += 1;
        }
        if self.extraction.fault.is_some() {
            errors += 1;
        }
        if self.extraction.teardown_fault.is_some() {
            errors += 1;
        }
        errors
    }
}

/// 任务汇总计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTotals {
    pub total_extracted: u32,
    pub total_saved: u32,
    pub total_duplicates: u32,
    pub total_errors: u32,
}

impl JobTotals {
    /// 将所有源的结果折叠为任务级计数
    pub fn fold(outcomes: &[SourceOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut totals, outcome| {
            totals.total_extracted += outcome.extraction.extraction_successes;
            totals.total_saved += outcome.persistence.articles_saved;
            totals.total_duplicates += outcome.persistence.duplicates_skipped();
            totals.total_errors += outcome.error_count();
            totals
        })
    }
}
