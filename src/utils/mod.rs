// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
/// 包括 robots.txt 检查、重试退避、URL 规范化、正文压缩与遥测初始化
pub mod compression;
pub mod retry_policy;
pub mod robots;
pub mod telemetry;
pub mod url_utils;
