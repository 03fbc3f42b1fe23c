// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含请求/响应 DTO 与用例实现，衔接表示层与领域层
pub mod dto;
pub mod use_cases;
