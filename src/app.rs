//! 应用装配
//!
//! 持有配置、传输层、任务运行器和取消令牌，负责启动 HTTP 服务、
//! 每日定时器和 CSV 启动任务，并在 Ctrl+C 时统一取消。

use crate::api;
use crate::config::Config;
use crate::csv::spawn_startup_transfer;
use crate::infrastructure::{build_publishers, NaverClient, RawLinePublisher, SearchTransport};
use crate::orchestrator::{DailyScheduler, JobRunner};
use crate::services::InspectService;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// 应用主结构
pub struct App {
    config: Config,
    runner: JobRunner,
    inspect: Arc<InspectService>,
    csv_publisher: Arc<dyn RawLinePublisher>,
    cancel: CancellationToken,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let transport: Arc<dyn SearchTransport> =
            Arc::new(NaverClient::new(&config).context("创建 Naver 客户端失败")?);
        let (book_publisher, csv_publisher) =
            build_publishers(&config).context("创建发布器失败")?;

        let cancel = CancellationToken::new();
        let runner = JobRunner::new(
            transport.clone(),
            book_publisher,
            config.clone(),
            cancel.clone(),
        );
        let inspect = Arc::new(InspectService::new(transport, config.clone(), cancel.clone()));

        Ok(Self {
            config,
            runner,
            inspect,
            csv_publisher,
            cancel,
        })
    }

    /// 运行应用主逻辑，直到收到 Ctrl+C
    pub async fn run(self) -> Result<()> {
        if spawn_startup_transfer(&self.config.csv, self.csv_publisher.clone()).is_some() {
            info!("📥 CSV 启动传输已在后台运行: {}", self.config.csv.file_path);
        }

        if self.config.batch.schedule_enabled {
            let at = self.config.batch.daily_time()?;
            let scheduler = DailyScheduler::new(self.runner.clone(), at, self.cancel.clone());
            tokio::spawn(scheduler.run());
        }

        let router = api::router(self.runner.clone(), self.inspect.clone());
        let bind_addr = &self.config.server.bind_addr;
        let listener = tokio::net::TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("监听地址 {} 失败", bind_addr))?;

        info!("🌐 HTTP 服务已启动: {}", bind_addr);
        info!("按 Ctrl+C 退出");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal(self.cancel.clone()))
            .await
            .context("HTTP 服务异常退出")?;

        info!("👋 已退出");
        Ok(())
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        // 无法监听信号时只能等外部取消
        cancel.cancelled().await;
        return;
    }
    info!("🛑 收到退出信号，正在停止...");
    cancel.cancel();
}

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 图书采集 worker 启动");
    info!("📊 worker 池大小: {}", config.batch.worker_pool_size);
    info!(
        "📚 start 上限: 全量 {} / 每日 {}",
        config.search.max_start, config.search.daily_max_start
    );
    info!("📤 发布方式: {:?}", config.publish.mode);
    if config.batch.schedule_enabled {
        info!("⏰ 每日扫描时间: {}", config.batch.daily_schedule);
    }
    info!("{}", "=".repeat(60));
}
