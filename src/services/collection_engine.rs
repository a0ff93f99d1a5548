//! 单个检索词的分页采集 - 业务能力层
//!
//! 对一个检索词从 start=1 开始逐页拉取，直到空页、达到 start 上限或超过 total。
//! 遇到限流时按 `RetryPolicy` 退避重试，连续限流达到阈值后进入慢速模式。
//! 限流重试耗尽不是错误：返回已收集的部分结果，并在 `StopReason` 中标明。

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::transport::SearchTransport;
use crate::infrastructure::wait::{wait_or_cancel, WaitOutcome};
use crate::models::{BookItem, PageRequest, SearchResponse};
use crate::services::rate_limit::RateLimitState;
use crate::services::retry_policy::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 单页请求的结果
///
/// 非限流错误走 `Err`，不在这里表示。
#[derive(Debug)]
pub enum FetchOutcome {
    Success(SearchResponse),
    /// 重试次数用完仍被限流
    Throttled,
    /// 等待期间收到取消信号
    Cancelled,
}

/// 采集结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 检索词为空，未调用上游
    InvalidQuery,
    /// 上游返回空页
    EmptyPage,
    /// display <= 0 或过大，无法计算下一页
    PageSizeExhausted,
    /// 下一页超过 start 上限
    LimitReached,
    /// 下一页超过 total
    TotalReached,
    /// 限流重试耗尽，结果不完整
    Throttled,
    /// 被取消，结果不完整
    Cancelled,
}

impl StopReason {
    /// 结果是否完整
    pub fn is_complete(self) -> bool {
        !matches!(self, StopReason::Throttled | StopReason::Cancelled)
    }
}

/// 一个检索词的采集结果
#[derive(Debug, Clone)]
pub struct Collection {
    pub query: String,
    pub items: Vec<BookItem>,
    /// 成功拉取的非空页数
    pub pages: u32,
    pub stop_reason: StopReason,
}

impl Collection {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.stop_reason.is_complete()
    }
}

/// 分页采集引擎
///
/// 限流状态归引擎所有，在同一次批处理的所有检索词之间延续。
/// 并发运行的批处理应各自持有一个引擎。
pub struct CollectionEngine {
    transport: Arc<dyn SearchTransport>,
    policy: RetryPolicy,
    default_max_start: u32,
    state: RateLimitState,
    cancel: CancellationToken,
}

impl CollectionEngine {
    pub fn new(
        transport: Arc<dyn SearchTransport>,
        policy: RetryPolicy,
        default_max_start: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            policy,
            default_max_start,
            state: RateLimitState::new(),
            cancel,
        }
    }

    /// 使用全量扫描的 start 上限作为默认上限
    pub fn from_config(
        transport: Arc<dyn SearchTransport>,
        config: &Config,
        cancel: CancellationToken,
    ) -> Self {
        Self::new(
            transport,
            RetryPolicy::from_config(&config.retry, &config.search),
            config.search.max_start,
            cancel,
        )
    }

    pub fn rate_limit_state(&self) -> &RateLimitState {
        &self.state
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 下一次翻页前应等待的时长（含抖动，慢速模式下翻倍）
    pub fn next_request_delay(&self) -> Duration {
        let slow_mode = self.state.is_slow_mode(Instant::now());
        self.policy.pacing_delay(self.policy.sample_jitter(), slow_mode)
    }

    /// 采集一个检索词的全部分页
    ///
    /// # 参数
    /// - `query`: 检索词，空白时直接返回空结果
    /// - `max_start_override`: start 上限，`None` 时使用配置值
    ///
    /// # 返回
    /// 非限流的上游错误直接返回 `Err`；限流耗尽或取消时返回部分结果
    pub async fn collect(&self, query: &str, max_start_override: Option<u32>) -> AppResult<Collection> {
        if query.trim().is_empty() {
            return Ok(Collection {
                query: query.to_string(),
                items: Vec::new(),
                pages: 0,
                stop_reason: StopReason::InvalidQuery,
            });
        }

        let limit = max_start_override.unwrap_or(self.default_max_start);
        let mut start: u32 = 1;
        let mut items = Vec::new();
        let mut pages = 0;

        let stop_reason = loop {
            if start > limit {
                break StopReason::LimitReached;
            }

            let response = match self.fetch_with_retry(query, start).await? {
                FetchOutcome::Success(response) => response,
                FetchOutcome::Throttled => {
                    warn!(
                        "⚠️ 限流重试已用完，提前结束采集: query='{}' start={} 已收集 {} 条",
                        query,
                        start,
                        items.len()
                    );
                    break StopReason::Throttled;
                }
                FetchOutcome::Cancelled => break StopReason::Cancelled,
            };

            if !response.has_items() {
                break StopReason::EmptyPage;
            }

            let SearchResponse {
                total,
                display,
                items: page_items,
                ..
            } = response;
            pages += 1;
            items.extend(page_items);

            let next_start = match next_start(start, display) {
                Some(next) => next,
                None => break StopReason::PageSizeExhausted,
            };
            if let Some(reason) = stop_before(next_start, limit, total) {
                break reason;
            }

            start = next_start as u32;
            if wait_or_cancel(self.next_request_delay(), &self.cancel).await == WaitOutcome::Cancelled {
                break StopReason::Cancelled;
            }
        };

        debug!(
            "采集结束: query='{}' pages={} items={} reason={:?}",
            query,
            pages,
            items.len(),
            stop_reason
        );

        Ok(Collection {
            query: query.to_string(),
            items,
            pages,
            stop_reason,
        })
    }

    /// 拉取单页，遇到限流时退避重试
    pub async fn fetch_with_retry(&self, query: &str, start: u32) -> AppResult<FetchOutcome> {
        let request = PageRequest::page(query, start);
        let mut attempt = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(FetchOutcome::Cancelled);
            }

            let err = match self.transport.search(&request).await {
                Ok(response) => {
                    self.state.record_success();
                    return Ok(FetchOutcome::Success(response));
                }
                Err(err) => err,
            };
            if !err.is_throttled() {
                return Err(err);
            }

            attempt += 1;
            let consecutive = self.state.record_throttle();
            let backoff = self.policy.backoff_delay(attempt);
            warn!(
                "Naver API rate limit (429). query='{}' start={} attempt={}/{} backoff={:?} consecutive429={}",
                query,
                start,
                attempt,
                self.policy.max_attempts,
                backoff,
                consecutive
            );

            if self.policy.should_enter_slow_mode(consecutive) {
                self.state
                    .extend_slow_mode(Instant::now() + self.policy.slow_mode_duration);
                warn!(
                    "🐢 进入慢速模式 {:?} (请求间隔 x{})",
                    self.policy.slow_mode_duration, self.policy.slow_mode_multiplier
                );
            }

            if wait_or_cancel(backoff, &self.cancel).await == WaitOutcome::Cancelled {
                return Ok(FetchOutcome::Cancelled);
            }
            if self.policy.is_exhausted(attempt) {
                return Ok(FetchOutcome::Throttled);
            }
        }
    }
}

/// display <= 0 或相加溢出时无法继续翻页
fn next_start(start: u32, display: i64) -> Option<i64> {
    if display <= 0 {
        return None;
    }
    i64::from(start).checked_add(display)
}

fn stop_before(next_start: i64, limit: u32, total: i64) -> Option<StopReason> {
    if next_start < 1 {
        Some(StopReason::PageSizeExhausted)
    } else if next_start > i64::from(limit) {
        Some(StopReason::LimitReached)
    } else if next_start > total {
        Some(StopReason::TotalReached)
    } else {
        None
    }
}
