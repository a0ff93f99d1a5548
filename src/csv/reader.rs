//! 本地 CSV 读取
//!
//! 输入路径可以是单个文件，也可以是目录（只读第一层的 `.csv` 文件，按文件名排序）。
//! 每个文件依次产生 `on_file_start → on_line* → on_file_end` 事件，
//! 读取出错时 `on_file_end` 仍然会被调用。

use crate::error::{AppError, AppResult, FileError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

const READ_BUFFER_SIZE: usize = 16_000;

/// 文件读取事件
#[async_trait]
pub trait CsvReadListener: Send {
    async fn on_file_start(&mut self, _file: &Path) {}

    /// `line_number` 从 1 开始
    async fn on_line(&mut self, file: &Path, line_number: usize, line: &str);

    async fn on_file_end(&mut self, _file: &Path) {}
}

pub struct CsvLocalReader;

impl CsvLocalReader {
    /// 读取文件或目录，把事件交给 `listener`
    pub async fn read(input: &Path, listener: &mut dyn CsvReadListener) -> AppResult<()> {
        let metadata = fs::metadata(input).await.map_err(|_| FileError::NotFound {
            path: input.display().to_string(),
        })?;

        if metadata.is_dir() {
            let files = Self::list_csv_files(input).await?;
            if files.is_empty() {
                warn!("⚠️ CSV 目录下没有 .csv 文件: {}", input.display());
                return Ok(());
            }
            for file in files {
                Self::read_file(&file, listener).await?;
            }
            return Ok(());
        }

        Self::read_file(input, listener).await
    }

    /// 目录第一层的 `.csv` 文件（扩展名不区分大小写），按文件名升序
    pub async fn list_csv_files(dir: &Path) -> AppResult<Vec<PathBuf>> {
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| AppError::file_read_failed(dir.display().to_string(), e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::file_read_failed(dir.display().to_string(), e))?
        {
            let path = entry.path();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file && has_csv_extension(&path) {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    async fn read_file(file: &Path, listener: &mut dyn CsvReadListener) -> AppResult<()> {
        let metadata = fs::metadata(file).await.map_err(|_| FileError::NotFound {
            path: file.display().to_string(),
        })?;
        if !metadata.is_file() {
            return Err(FileError::NotAFile {
                path: file.display().to_string(),
            }
            .into());
        }

        listener.on_file_start(file).await;
        let result = Self::read_lines(file, listener).await;
        listener.on_file_end(file).await;
        result
    }

    async fn read_lines(file: &Path, listener: &mut dyn CsvReadListener) -> AppResult<()> {
        let handle = fs::File::open(file)
            .await
            .map_err(|e| AppError::file_read_failed(file.display().to_string(), e))?;
        let mut lines = BufReader::with_capacity(READ_BUFFER_SIZE, handle).lines();

        let mut line_number = 0;
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| AppError::file_read_failed(file.display().to_string(), e))?
        {
            line_number += 1;
            listener.on_line(file, line_number, &line).await;
        }
        Ok(())
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
}
