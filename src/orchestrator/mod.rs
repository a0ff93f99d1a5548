//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量采集和调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_orchestrator` - 批量采集编排器
//! - 生成检索词列表（全量 / 每日）
//! - 顺序调用 CollectionEngine
//! - 隔离单个检索词的失败
//! - 发布结果并输出统计
//!
//! ### `job_runner` - 任务运行器
//! - 有界 worker 池（Semaphore）
//! - 每次运行创建全新的编排器和引擎
//!
//! ### `scheduler` - 每日定时器
//! - 每天固定时间提交每日扫描
//!
//! ## 层次关系
//!
//! ```text
//! scheduler / api
//!     ↓
//! job_runner (并发控制)
//!     ↓
//! batch_orchestrator (处理 Vec<query>)
//!     ↓
//! services::CollectionEngine (处理单个 query)
//!     ↓
//! infrastructure (SearchTransport / PublishTransport)
//! ```

pub mod batch_orchestrator;
pub mod job_runner;
pub mod scheduler;

pub use batch_orchestrator::{BatchOrchestrator, ScanKind, ScanReport};
pub use job_runner::JobRunner;
pub use scheduler::{next_run_after, DailyScheduler};
