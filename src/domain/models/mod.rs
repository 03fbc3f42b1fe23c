// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了内容聚合引擎的核心业务实体，包括：
/// - 内容源（source）：带礼貌策略的 Feed 来源
/// - 抓取任务（job）：任务状态机与终态推导
/// - 文章（article）：抽取候选、抽取结果与持久化记录
/// - 源结果（source_result）：抽取与持久化两阶段统计
/// - 任务事件（job_event）：结构化审计日志
pub mod article;
pub mod job;
pub mod job_event;
pub mod source;
pub mod source_result;
