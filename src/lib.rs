// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 分析模块
///
/// 价格归一化、价格变化检测与跨店比价
pub mod analysis;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 抓取流水线模块
///
/// Robots闸门、限速器、抓取器、单轮编排与周期调度
pub mod crawler;

/// 领域模块
///
/// 包含核心业务实体和协作方接口
pub mod domain;

/// 引擎模块
///
/// 静态HTTP抓取引擎与无头浏览器渲染引擎
pub mod engines;

/// 基础设施模块
///
/// 提供外部服务集成：SQLite存储、Webhook通知
pub mod infrastructure;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
