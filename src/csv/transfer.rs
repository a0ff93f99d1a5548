//! CSV 传输流程与启动任务

use crate::config::CsvConfig;
use crate::csv::listener::CsvTransferListener;
use crate::csv::reader::CsvLocalReader;
use crate::csv::stats::TransferStats;
use crate::error::{AppError, AppResult};
use crate::infrastructure::transport::RawLinePublisher;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub struct CsvDataTransfer {
    publisher: Arc<dyn RawLinePublisher>,
}

impl CsvDataTransfer {
    pub fn new(publisher: Arc<dyn RawLinePublisher>) -> Self {
        Self { publisher }
    }

    /// 读取文件或目录并逐行发布，返回统计
    ///
    /// 读取中途出错时返回错误，已发布的行不会回滚。
    pub async fn transfer(&self, input: &Path) -> AppResult<TransferStats> {
        if input.as_os_str().is_empty() {
            return Err(AppError::invalid_config("csv.file_path", "不能为空"));
        }

        info!("{}", "=".repeat(60));
        info!("📥 CSV 传输开始: {}", input.display());
        info!("{}", "=".repeat(60));

        let mut listener = CsvTransferListener::new(self.publisher.clone());
        CsvLocalReader::read(input, &mut listener).await?;
        let stats = listener.into_stats();

        info!(
            "✓ CSV 传输完成: input={} files={} total={} skipped={} published={} failed={}",
            input.display(),
            stats.file_count(),
            stats.total_lines(),
            stats.skipped_lines(),
            stats.published_lines(),
            stats.failed_lines()
        );
        Ok(stats)
    }
}

/// 启动时在后台执行一次 CSV 传输
///
/// 未启用时返回 `None`；路径不存在时记录警告并跳过。
pub fn spawn_startup_transfer(
    config: &CsvConfig,
    publisher: Arc<dyn RawLinePublisher>,
) -> Option<JoinHandle<Option<TransferStats>>> {
    if !config.enabled {
        return None;
    }

    let input = PathBuf::from(&config.file_path);
    if !input.exists() {
        warn!("⚠️ CSV 输入路径不存在，跳过启动传输: {}", input.display());
        return None;
    }

    Some(tokio::spawn(async move {
        match CsvDataTransfer::new(publisher).transfer(&input).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                error!("❌ CSV 启动传输失败: {}", e);
                None
            }
        }
    }))
}
