//! 程序配置
//!
//! 加载顺序：默认值 → TOML 文件（`COLLECTOR_CONFIG`，默认 `collector.toml`，存在时才读取）→ 环境变量覆盖。

use crate::error::{AppError, AppResult, ConfigError, FileError};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// 配置文件路径环境变量
pub const CONFIG_PATH_ENV: &str = "COLLECTOR_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "collector.toml";

/// 批处理线程池上下限
pub const MIN_WORKER_POOL_SIZE: usize = 2;
pub const MAX_WORKER_POOL_SIZE: usize = 4;

/// 程序配置文件
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 是否显示详细日志
    pub verbose_logging: bool,
    pub naver: NaverConfig,
    pub search: SearchConfig,
    pub retry: RetryConfig,
    pub batch: BatchConfig,
    pub publish: PublishConfig,
    pub server: ServerConfig,
    pub csv: CsvConfig,
}

/// 네이버 Open API 接入配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NaverConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// 单次 HTTP 请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for NaverConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openapi.naver.com".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout_secs: 10,
        }
    }
}

/// 搜索 / 分页配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// 每页条数 (1~100)
    pub display: u32,
    /// 排序方式 (sim / date)
    pub sort: String,
    /// 全量扫描的 start 上限
    pub max_start: u32,
    /// 每日扫描的 start 上限
    pub daily_max_start: u32,
    /// 相邻请求之间的基础间隔（毫秒），0 表示不等待
    pub request_interval_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            display: 100,
            sort: "date".to_string(),
            max_start: 1000,
            daily_max_start: 300,
            request_interval_ms: 200,
        }
    }
}

/// 限流重试配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub slow_mode_threshold: u32,
    pub slow_mode_duration_ms: u64,
    pub slow_mode_multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 2_000,
            slow_mode_threshold: 3,
            slow_mode_duration_ms: 180_000,
            slow_mode_multiplier: 2,
        }
    }
}

/// 重试耗尽后的部分结果如何处理
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialResultPolicy {
    /// 照常发布已收集到的部分结果
    #[default]
    Publish,
    /// 丢弃不完整的结果
    Discard,
}

impl FromStr for PartialResultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "publish" => Ok(Self::Publish),
            "discard" => Ok(Self::Discard),
            other => Err(format!("未知的部分结果策略: {}", other)),
        }
    }
}

/// 批处理配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// 批处理任务并发数 (2~4)
    pub worker_pool_size: usize,
    pub partial_result_policy: PartialResultPolicy,
    /// 是否启用每日定时扫描
    pub schedule_enabled: bool,
    /// 每日扫描时间（本地时间 HH:MM）
    pub daily_schedule: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: MIN_WORKER_POOL_SIZE,
            partial_result_policy: PartialResultPolicy::Publish,
            schedule_enabled: true,
            daily_schedule: "02:00".to_string(),
        }
    }
}

impl BatchConfig {
    /// 解析每日扫描时间
    pub fn daily_time(&self) -> AppResult<NaiveTime> {
        NaiveTime::parse_from_str(self.daily_schedule.trim(), "%H:%M").map_err(|e| {
            AppError::invalid_config("batch.daily_schedule", format!("{} ({})", self.daily_schedule, e))
        })
    }
}

/// 发布方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishMode {
    /// Kafka REST Proxy (v2 JSON)
    #[default]
    RestProxy,
    /// 写入本地 JSON Lines 文件
    Jsonl,
}

impl FromStr for PublishMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest_proxy" | "rest-proxy" => Ok(Self::RestProxy),
            "jsonl" => Ok(Self::Jsonl),
            other => Err(format!("未知的发布方式: {}", other)),
        }
    }
}

/// 下游发布配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub mode: PublishMode,
    /// REST Proxy 地址
    pub endpoint: String,
    pub book_topic: String,
    pub csv_topic: String,
    /// jsonl 模式下的输出目录
    pub jsonl_dir: String,
    pub timeout_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            mode: PublishMode::RestProxy,
            endpoint: "http://localhost:8082".to_string(),
            book_topic: "book.raw".to_string(),
            csv_topic: "book.csv.raw".to_string(),
            jsonl_dir: "published".to_string(),
            timeout_secs: 10,
        }
    }
}

/// HTTP 服务配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// CSV 导入配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    /// 启动时是否执行 CSV 导入
    pub enabled: bool,
    /// CSV 文件或目录
    pub file_path: String,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            file_path: "data/csv".to_string(),
        }
    }
}

impl Config {
    /// 按 默认值 → TOML → 环境变量 的顺序加载配置
    pub fn load() -> AppResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = if Path::new(&path).is_file() {
            info!("📄 读取配置文件: {}", path);
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::file_read_failed(path, e))?;
        toml::from_str(&content).map_err(|e| {
            AppError::File(FileError::TomlParseFailed {
                path: path.to_string(),
                source: Box::new(e),
            })
        })
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// 用环境变量覆盖配置；`lookup` 便于测试时注入
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<()> {
        override_parsed(&lookup, "VERBOSE_LOGGING", &mut self.verbose_logging)?;

        override_string(&lookup, "NAVER_BASE_URL", &mut self.naver.base_url);
        override_string(&lookup, "NAVER_CLIENT_ID", &mut self.naver.client_id);
        override_string(&lookup, "NAVER_CLIENT_SECRET", &mut self.naver.client_secret);
        override_parsed(&lookup, "NAVER_TIMEOUT_SECS", &mut self.naver.timeout_secs)?;

        override_parsed(&lookup, "NAVER_SEARCH_DISPLAY", &mut self.search.display)?;
        override_string(&lookup, "NAVER_SEARCH_SORT", &mut self.search.sort);
        override_parsed(&lookup, "NAVER_SEARCH_MAX_START", &mut self.search.max_start)?;
        override_parsed(&lookup, "NAVER_SEARCH_DAILY_MAX_START", &mut self.search.daily_max_start)?;
        override_parsed(&lookup, "NAVER_SEARCH_REQUEST_INTERVAL_MS", &mut self.search.request_interval_ms)?;

        override_parsed(&lookup, "BATCH_WORKER_POOL_SIZE", &mut self.batch.worker_pool_size)?;
        override_parsed(&lookup, "BATCH_PARTIAL_RESULT_POLICY", &mut self.batch.partial_result_policy)?;
        override_parsed(&lookup, "BATCH_SCHEDULE_ENABLED", &mut self.batch.schedule_enabled)?;
        override_string(&lookup, "BATCH_DAILY_SCHEDULE", &mut self.batch.daily_schedule);

        override_parsed(&lookup, "PUBLISH_MODE", &mut self.publish.mode)?;
        override_string(&lookup, "PUBLISH_ENDPOINT", &mut self.publish.endpoint);
        override_string(&lookup, "PUBLISH_BOOK_TOPIC", &mut self.publish.book_topic);
        override_string(&lookup, "PUBLISH_CSV_TOPIC", &mut self.publish.csv_topic);
        override_string(&lookup, "PUBLISH_JSONL_DIR", &mut self.publish.jsonl_dir);

        override_string(&lookup, "SERVER_BIND_ADDR", &mut self.server.bind_addr);

        override_parsed(&lookup, "CSV_BOOK_ENABLED", &mut self.csv.enabled)?;
        override_string(&lookup, "CSV_BOOK_FILE_PATH", &mut self.csv.file_path);
        Ok(())
    }

    /// 校验配置；线程池大小超出范围时收敛到 2~4
    pub fn validate(&mut self) -> AppResult<()> {
        if self.search.display == 0 || self.search.display > 100 {
            return Err(AppError::invalid_config("search.display", "必须在 1~100 之间"));
        }
        if self.search.max_start == 0 {
            return Err(AppError::invalid_config("search.max_start", "必须大于 0"));
        }
        if self.search.daily_max_start == 0 {
            return Err(AppError::invalid_config("search.daily_max_start", "必须大于 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::invalid_config("retry.max_attempts", "必须大于 0"));
        }
        self.batch.daily_time()?;

        let clamped = self
            .batch
            .worker_pool_size
            .clamp(MIN_WORKER_POOL_SIZE, MAX_WORKER_POOL_SIZE);
        if clamped != self.batch.worker_pool_size {
            warn!(
                "⚠️ worker_pool_size={} 超出范围，已调整为 {}",
                self.batch.worker_pool_size, clamped
            );
            self.batch.worker_pool_size = clamped;
        }
        Ok(())
    }
}

fn override_string(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut String) {
    if let Some(value) = lookup(key) {
        *target = value;
    }
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) -> AppResult<()> {
    if let Some(value) = lookup(key) {
        *target = value.trim().parse().map_err(|_| {
            AppError::Config(ConfigError::EnvVarParseFailed {
                var_name: key.to_string(),
                value: value.clone(),
                expected_type: std::any::type_name::<T>().to_string(),
            })
        })?;
    }
    Ok(())
}
