// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 测试主模块
///
/// 集成测试基于内存 SQLite 与 wiremock，覆盖仓库、抓取流水线与 HTTP 接口
mod integration;
