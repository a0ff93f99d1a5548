//! 批量采集编排器 - 编排层
//!
//! ## 职责
//!
//! 按检索词列表顺序调用 `CollectionEngine`，把非空结果交给发布端。
//!
//! ## 核心功能
//!
//! 1. **全量扫描**：55 个检索词，使用全量 start 上限
//! 2. **每日扫描**：按星期取其中一部分，使用每日 start 上限或调用方指定的上限
//! 3. **错误隔离**：单个检索词失败只记录日志，批处理继续
//! 4. **部分结果**：限流中断的结果按 `PartialResultPolicy` 发布或丢弃
//! 5. **取消**：收到取消信号后在当前检索词结束时停止
//!
//! ## 设计特点
//!
//! - 同一次扫描内所有检索词共用一个引擎，限流状态不会被重置
//! - 不关心单页请求的细节，只做调度和统计

use crate::config::{Config, PartialResultPolicy};
use crate::infrastructure::transport::{PublishTransport, SearchTransport};
use crate::pattern::QueryPatternGenerator;
use crate::services::collection_engine::{Collection, CollectionEngine, StopReason};
use chrono::Weekday;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 扫描类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    Full,
    Daily,
}

impl fmt::Display for ScanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanKind::Full => write!(f, "full-scan"),
            ScanKind::Daily => write!(f, "daily-scan"),
        }
    }
}

/// 一次扫描的统计
///
/// `succeeded`、`empty`、`discarded`、`failed` 互斥；`partial` 统计结果不完整的检索词，
/// 与前四者有重叠。
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub kind: ScanKind,
    pub queries_total: usize,
    pub succeeded: usize,
    pub empty: usize,
    pub partial: usize,
    /// 结果不完整且按策略丢弃
    pub discarded: usize,
    pub failed: usize,
    pub items_collected: usize,
    pub items_published: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl ScanReport {
    pub fn new(kind: ScanKind, queries_total: usize) -> Self {
        Self {
            kind,
            queries_total,
            succeeded: 0,
            empty: 0,
            partial: 0,
            discarded: 0,
            failed: 0,
            items_collected: 0,
            items_published: 0,
            cancelled: false,
            elapsed: Duration::ZERO,
        }
    }

    /// 已处理的检索词数
    pub fn processed(&self) -> usize {
        self.succeeded + self.empty + self.discarded + self.failed
    }
}

/// 批量采集编排器
pub struct BatchOrchestrator {
    engine: CollectionEngine,
    publisher: Arc<dyn PublishTransport>,
    partial_policy: PartialResultPolicy,
    daily_max_start: u32,
    cancel: CancellationToken,
}

impl BatchOrchestrator {
    pub fn new(
        engine: CollectionEngine,
        publisher: Arc<dyn PublishTransport>,
        partial_policy: PartialResultPolicy,
        daily_max_start: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            engine,
            publisher,
            partial_policy,
            daily_max_start,
            cancel,
        }
    }

    /// 按配置创建一个带全新引擎的编排器
    pub fn from_config(
        transport: Arc<dyn SearchTransport>,
        publisher: Arc<dyn PublishTransport>,
        config: &Config,
        cancel: CancellationToken,
    ) -> Self {
        let engine = CollectionEngine::from_config(transport, config, cancel.clone());
        Self::new(
            engine,
            publisher,
            config.batch.partial_result_policy,
            config.search.daily_max_start,
            cancel,
        )
    }

    /// 全量扫描：每个检索词使用全量 start 上限
    pub async fn full_scan(&self) -> ScanReport {
        self.run(ScanKind::Full, QueryPatternGenerator::full_scan(), None)
            .await
    }

    /// 按今天的星期执行每日扫描
    pub async fn daily_scan(&self, max_start_override: Option<u32>) -> ScanReport {
        self.run_daily(QueryPatternGenerator::daily_scan_today(), max_start_override)
            .await
    }

    /// 按指定星期执行每日扫描
    pub async fn daily_scan_for(&self, weekday: Weekday, max_start_override: Option<u32>) -> ScanReport {
        self.run_daily(QueryPatternGenerator::daily_scan(weekday), max_start_override)
            .await
    }

    /// 未指定上限时使用每日上限
    async fn run_daily(&self, queries: Vec<String>, max_start_override: Option<u32>) -> ScanReport {
        let limit = max_start_override.unwrap_or(self.daily_max_start);
        self.run(ScanKind::Daily, queries, Some(limit)).await
    }

    async fn run(&self, kind: ScanKind, queries: Vec<String>, max_start: Option<u32>) -> ScanReport {
        let started = Instant::now();
        let mut report = ScanReport::new(kind, queries.len());
        log_scan_start(kind, queries.len(), max_start);

        for (idx, query) in queries.iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            info!("[{} {}/{}] 🔍 query='{}'", kind, idx + 1, queries.len(), query);
            let collection = match self.engine.collect(query, max_start).await {
                Ok(collection) => collection,
                Err(e) => {
                    error!("[{}] ❌ 采集失败: query='{}' error={}", kind, query, e);
                    report.failed += 1;
                    continue;
                }
            };

            let cancelled = collection.stop_reason == StopReason::Cancelled;
            self.handle_collection(kind, collection, &mut report).await;
            if cancelled {
                report.cancelled = true;
                break;
            }
        }

        report.elapsed = started.elapsed();
        log_scan_complete(&report);
        report
    }

    async fn handle_collection(&self, kind: ScanKind, collection: Collection, report: &mut ScanReport) {
        report.items_collected += collection.items.len();
        if !collection.is_complete() {
            report.partial += 1;
        }

        if collection.is_empty() {
            info!("[{}] query='{}' 无结果，跳过发布", kind, collection.query);
            report.empty += 1;
            return;
        }

        if !collection.is_complete() && self.partial_policy == PartialResultPolicy::Discard {
            warn!(
                "[{}] ⚠️ query='{}' 结果不完整 ({:?})，按策略丢弃 {} 条",
                kind,
                collection.query,
                collection.stop_reason,
                collection.items.len()
            );
            report.discarded += 1;
            return;
        }

        match self.publisher.publish(&collection.items).await {
            Ok(()) => {
                info!(
                    "[{}] ✓ query='{}' pages={} 发布 {} 条",
                    kind,
                    collection.query,
                    collection.pages,
                    collection.items.len()
                );
                report.items_published += collection.items.len();
                report.succeeded += 1;
            }
            Err(e) => {
                error!("[{}] ❌ 发布失败: query='{}' error={}", kind, collection.query, e);
                report.failed += 1;
            }
        }
    }
}

// ========== 日志辅助函数 ==========

fn log_scan_start(kind: ScanKind, total: usize, max_start: Option<u32>) {
    info!("{}", "=".repeat(60));
    info!("🚀 开始 {} - 共 {} 个检索词", kind, total);
    match max_start {
        Some(limit) => info!("📊 start 上限: {}", limit),
        None => info!("📊 start 上限: 使用配置值"),
    }
    info!("{}", "=".repeat(60));
}

fn log_scan_complete(report: &ScanReport) {
    info!("\n{}", "=".repeat(60));
    info!("📊 {} 完成统计 (耗时 {:?})", report.kind, report.elapsed);
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.succeeded, report.queries_total);
    info!("📭 无结果: {}", report.empty);
    info!("⚠️ 不完整: {} (丢弃 {})", report.partial, report.discarded);
    info!("❌ 失败: {}", report.failed);
    info!(
        "📦 采集 {} 条 / 发布 {} 条",
        report.items_collected, report.items_published
    );
    if report.cancelled {
        warn!("🛑 扫描被取消，已处理 {}/{}", report.processed(), report.queries_total);
    }
    info!("{}", "=".repeat(60));
}
