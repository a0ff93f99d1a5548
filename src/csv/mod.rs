//! CSV 数据导入
//!
//! - `reader` - 读取本地文件 / 目录，产生文件事件
//! - `listener` - 跳过表头和空行，逐行发布
//! - `stats` - 文件级与整体统计
//! - `transfer` - 传输流程与启动任务

pub mod listener;
pub mod reader;
pub mod stats;
pub mod transfer;

pub use listener::CsvTransferListener;
pub use reader::{CsvLocalReader, CsvReadListener};
pub use stats::{FileStats, TransferStats};
pub use transfer::{spawn_startup_transfer, CsvDataTransfer};
