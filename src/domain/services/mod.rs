// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含内容聚合的核心业务逻辑服务：
/// - Feed 读取（feed_reader）：获取并解析 Feed，产出抽取候选
/// - 内容抽取（extraction）：结构化数据 → 选择器级联 → meta 标签的抽取级联
/// - 去重（deduplicator）：URL 与内容指纹的唯一性检查
/// - 持久化网关（persistence_gateway）：单篇文章事务写入
/// - 事件记录（event_logger）：带关联 ID 的结构化事件与资源快照
pub mod deduplicator;
pub mod event_logger;
pub mod extraction;
pub mod feed_reader;
pub mod persistence_gateway;
