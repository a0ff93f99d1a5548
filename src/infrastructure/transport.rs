//! 传输层抽象
//!
//! 上游检索和下游发布都只通过这里的 trait 暴露能力，业务层不关心具体实现。

use crate::error::AppResult;
use crate::models::{BookItem, PageRequest, SearchResponse};
use async_trait::async_trait;

/// 单页检索
///
/// 限流必须以 `ApiError::RateLimited` 返回（见 `AppError::is_throttled`），
/// 其余错误原样返回。
#[async_trait]
pub trait SearchTransport: Send + Sync {
    async fn search(&self, request: &PageRequest) -> AppResult<SearchResponse>;
}

/// 图书元数据发布
#[async_trait]
pub trait PublishTransport: Send + Sync {
    async fn publish(&self, items: &[BookItem]) -> AppResult<()>;
}

/// CSV 原始行发布
#[async_trait]
pub trait RawLinePublisher: Send + Sync {
    async fn publish_line(&self, line: &str) -> AppResult<()>;
}
