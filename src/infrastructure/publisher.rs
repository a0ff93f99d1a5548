//! 下游发布实现
//!
//! - `RestProxyPublisher` - 通过 Kafka REST Proxy (v2 JSON) 写入 topic
//! - `JsonLinesPublisher` - 追加写入本地 JSON Lines 文件，用于本地调试

use crate::config::{Config, PublishMode};
use crate::error::{AppError, AppResult, FileError, PublishError};
use crate::infrastructure::transport::{PublishTransport, RawLinePublisher};
use crate::models::BookItem;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

const KAFKA_JSON_V2: &str = "application/vnd.kafka.json.v2+json";

/// Kafka REST Proxy 发布器（一个实例对应一个 topic）
#[derive(Clone)]
pub struct RestProxyPublisher {
    http: Client,
    url: String,
    topic: String,
}

impl RestProxyPublisher {
    pub fn new(endpoint: &str, topic: &str, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::publish_failed(endpoint, e))?;
        Ok(Self {
            http,
            url: format!("{}/topics/{}", endpoint.trim_end_matches('/'), topic),
            topic: topic.to_string(),
        })
    }

    async fn send_records(&self, values: Vec<Value>) -> AppResult<()> {
        let body = json!({
            "records": values.into_iter().map(|value| json!({ "value": value })).collect::<Vec<_>>()
        });

        let response = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, KAFKA_JSON_V2)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::publish_failed(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Publish(PublishError::Rejected {
                target: self.url.clone(),
                status: status.as_u16(),
                body,
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl PublishTransport for RestProxyPublisher {
    async fn publish(&self, items: &[BookItem]) -> AppResult<()> {
        if items.is_empty() {
            debug!("跳过发布: items 为空");
            return Ok(());
        }
        let values = items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.send_records(values).await?;
        info!("📤 已发布 {} 条记录到 topic '{}'", items.len(), self.topic);
        Ok(())
    }
}

#[async_trait]
impl RawLinePublisher for RestProxyPublisher {
    async fn publish_line(&self, line: &str) -> AppResult<()> {
        self.send_records(vec![Value::String(line.to_string())]).await
    }
}

/// JSON Lines 文件发布器
pub struct JsonLinesPublisher {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append<T: Serialize + ?Sized>(&self, records: &[&T]) -> AppResult<()> {
        let mut buffer = String::new();
        for record in records {
            buffer.push_str(&serde_json::to_string(record)?);
            buffer.push('\n');
        }

        let _guard = self.write_lock.lock().await;
        let write_failed = |e: std::io::Error| {
            AppError::File(FileError::WriteFailed {
                path: self.path.display().to_string(),
                source: Box::new(e),
            })
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(write_failed)?;
        file.write_all(buffer.as_bytes()).await.map_err(write_failed)?;
        file.flush().await.map_err(write_failed)?;
        Ok(())
    }
}

#[async_trait]
impl PublishTransport for JsonLinesPublisher {
    async fn publish(&self, items: &[BookItem]) -> AppResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        let records: Vec<&BookItem> = items.iter().collect();
        self.append(records.as_slice()).await?;
        info!("📤 已写入 {} 条记录到 {}", items.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl RawLinePublisher for JsonLinesPublisher {
    async fn publish_line(&self, line: &str) -> AppResult<()> {
        self.append::<str>(&[line]).await
    }
}

/// 按配置创建图书发布器和 CSV 行发布器
pub fn build_publishers(
    config: &Config,
) -> AppResult<(Arc<dyn PublishTransport>, Arc<dyn RawLinePublisher>)> {
    let publish = &config.publish;
    match publish.mode {
        PublishMode::RestProxy => {
            let timeout = Duration::from_secs(publish.timeout_secs);
            let books = RestProxyPublisher::new(&publish.endpoint, &publish.book_topic, timeout)?;
            let lines = RestProxyPublisher::new(&publish.endpoint, &publish.csv_topic, timeout)?;
            Ok((Arc::new(books), Arc::new(lines)))
        }
        PublishMode::Jsonl => {
            let dir = Path::new(&publish.jsonl_dir);
            let books = JsonLinesPublisher::new(dir.join(format!("{}.jsonl", publish.book_topic)));
            let lines = JsonLinesPublisher::new(dir.join(format!("{}.jsonl", publish.csv_topic)));
            Ok((Arc::new(books), Arc::new(lines)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str) -> BookItem {
        BookItem {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn jsonl_publisher_appends_one_record_per_line() {
        let dir = tempfile::TempDir::new().unwrap();
        let publisher = JsonLinesPublisher::new(dir.path().join("out/book.raw.jsonl"));

        publisher.publish(&[book("a"), book("b")]).await.unwrap();
        publisher.publish(&[]).await.unwrap();
        publisher.publish(&[book("c")]).await.unwrap();

        let content = tokio::fs::read_to_string(publisher.path()).await.unwrap();
        let titles: Vec<String> = content
            .lines()
            .map(|line| serde_json::from_str::<BookItem>(line).unwrap().title)
            .collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn jsonl_publisher_writes_raw_lines_as_json_strings() {
        let dir = tempfile::TempDir::new().unwrap();
        let publisher = JsonLinesPublisher::new(dir.path().join("csv.jsonl"));

        publisher.publish_line("1,\"제목\",저자").await.unwrap();

        let content = tokio::fs::read_to_string(publisher.path()).await.unwrap();
        let value: String = serde_json::from_str(content.trim_end()).unwrap();
        assert_eq!(value, "1,\"제목\",저자");
    }

    #[test]
    fn jsonl_mode_names_files_after_topics() {
        let mut config = Config::default();
        config.publish.mode = PublishMode::Jsonl;
        tokio_test::assert_ok!(build_publishers(&config));
    }
}
