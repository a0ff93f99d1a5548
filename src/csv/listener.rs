//! CSV 传输监听器
//!
//! 第 1 行（表头）和空白行跳过，其余原始行逐行发布。
//! 单行发布失败只计数并记录日志，不中断整个传输。

use crate::csv::reader::CsvReadListener;
use crate::csv::stats::TransferStats;
use crate::infrastructure::transport::RawLinePublisher;
use crate::utils::logging::truncate_text;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct CsvTransferListener {
    publisher: Arc<dyn RawLinePublisher>,
    stats: TransferStats,
}

impl CsvTransferListener {
    pub fn new(publisher: Arc<dyn RawLinePublisher>) -> Self {
        Self {
            publisher,
            stats: TransferStats::new(),
        }
    }

    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    pub fn into_stats(self) -> TransferStats {
        self.stats
    }
}

fn is_header_or_blank(line_number: usize, line: &str) -> bool {
    line_number == 1 || line.trim().is_empty()
}

#[async_trait]
impl CsvReadListener for CsvTransferListener {
    async fn on_file_start(&mut self, file: &Path) {
        self.stats.ensure_file(file);
        debug!("CSV 文件开始处理: {}", file.display());
    }

    async fn on_line(&mut self, file: &Path, line_number: usize, line: &str) {
        self.stats.update_total_lines(file, line_number);

        if is_header_or_blank(line_number, line) {
            self.stats.increment_skipped(file);
            return;
        }

        match self.publisher.publish_line(line).await {
            Ok(()) => self.stats.increment_published(file),
            Err(e) => {
                warn!(
                    "⚠️ CSV 行发布失败: file={} line={} content='{}' error={}",
                    file.display(),
                    line_number,
                    truncate_text(line, 80),
                    e
                );
                self.stats.increment_failed(file);
            }
        }
    }

    async fn on_file_end(&mut self, file: &Path) {
        let s = self.stats.get(file);
        info!(
            "📄 CSV 文件汇总: file={} total={} skipped={} published={} failed={}",
            file.display(),
            s.total_lines,
            s.skipped_lines,
            s.published_lines,
            s.failed_lines
        );
    }
}
