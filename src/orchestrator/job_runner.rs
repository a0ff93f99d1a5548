//! 批处理任务运行器
//!
//! 触发接口和定时器都通过这里提交扫描，调用方不会被阻塞。
//! 同时运行的扫描数由 Semaphore 限制，每次运行都使用全新的引擎。

use crate::config::Config;
use crate::error::{AppError, BusinessError};
use crate::infrastructure::transport::{PublishTransport, SearchTransport};
use crate::orchestrator::batch_orchestrator::{BatchOrchestrator, ScanKind, ScanReport};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Clone)]
pub struct JobRunner {
    transport: Arc<dyn SearchTransport>,
    publisher: Arc<dyn PublishTransport>,
    config: Arc<Config>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl JobRunner {
    pub fn new(
        transport: Arc<dyn SearchTransport>,
        publisher: Arc<dyn PublishTransport>,
        config: Config,
        cancel: CancellationToken,
    ) -> Self {
        let pool_size = config.batch.worker_pool_size.max(1);
        Self {
            transport,
            publisher,
            config: Arc::new(config),
            permits: Arc::new(Semaphore::new(pool_size)),
            cancel,
        }
    }

    pub fn submit_full_scan(&self) -> JoinHandle<ScanReport> {
        self.submit(ScanKind::Full, None)
    }

    pub fn submit_daily_scan(&self, max_start: Option<u32>) -> JoinHandle<ScanReport> {
        self.submit(ScanKind::Daily, max_start)
    }

    fn submit(&self, kind: ScanKind, max_start: Option<u32>) -> JoinHandle<ScanReport> {
        let runner = self.clone();
        info!("📥 已提交 {} (maxStart={:?})", kind, max_start);

        tokio::spawn(async move {
            let _permit = match runner.permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    let err = AppError::from(BusinessError::JobRejected {
                        kind: kind.to_string(),
                    });
                    error!("❌ {}", err);
                    let mut report = ScanReport::new(kind, 0);
                    report.cancelled = true;
                    return report;
                }
            };

            let orchestrator = BatchOrchestrator::from_config(
                runner.transport.clone(),
                runner.publisher.clone(),
                &runner.config,
                runner.cancel.clone(),
            );
            match kind {
                ScanKind::Full => orchestrator.full_scan().await,
                ScanKind::Daily => orchestrator.daily_scan(max_start).await,
            }
        })
    }
}
