// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// 编排领域服务与仓库，向表示层提供任务、源与内容的操作
pub mod job_use_case;
