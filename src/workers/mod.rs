// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供抓取任务的后台执行：
/// - 任务编排（job_orchestrator）：任务生命周期与源级并发池
/// - 源处理（source_worker）：单个源的抓取、抽取、去重与保存
/// - 任务管理（manager）：运行中任务、取消标记与优雅关闭
pub mod job_orchestrator;
pub mod manager;
pub mod source_worker;
