// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 仓库接口定义了数据持久化的抽象契约，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 任务仓库（job_repository）：抓取任务的持久化
/// - 内容源仓库（source_repository）：只读访问激活的内容源
/// - 内容仓库（content_repository）：带唯一约束的文章写入与查询
/// - 任务事件仓库（job_event_repository）：结构化事件的追加与查询
pub mod content_repository;
pub mod job_event_repository;
pub mod job_repository;
pub mod source_repository;
