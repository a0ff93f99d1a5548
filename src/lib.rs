//! # Book Collecting Worker
//!
//! 从 네이버 책 검색 API 批量采集图书元数据并发布到下游的 worker
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源（HTTP 客户端、文件），只暴露能力
//! - `SearchTransport` / `PublishTransport` / `RawLinePublisher` - 传输抽象
//! - `NaverClient` - 上游检索实现，429 映射为限流错误
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 只处理单个检索词
//! - `CollectionEngine` - 分页采集、限流退避、慢速模式
//! - `RetryPolicy` / `RateLimitState` - 重试计算与限流状态
//! - `InspectService` - 运维检查用的单页检索 / 采集
//!
//! ### ③ 编排层（Orchestration）
//! - `pattern/` - 全量 / 每日检索词列表
//! - `orchestrator/batch_orchestrator` - 顺序处理检索词列表，隔离失败
//! - `orchestrator/job_runner` - 有界 worker 池
//! - `orchestrator/scheduler` - 每日定时扫描
//!
//! ### ④ 入口层
//! - `api/` - axum 路由（触发 / 检查）
//! - `csv/` - 本地 CSV 导入
//! - `app` - 装配与生命周期
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod config;
pub mod csv;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod pattern;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{BookItem, PageRequest, SearchResponse};
pub use orchestrator::{BatchOrchestrator, JobRunner, ScanKind, ScanReport};
pub use pattern::QueryPatternGenerator;
pub use services::{Collection, CollectionEngine, StopReason};
