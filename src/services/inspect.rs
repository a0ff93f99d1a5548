//! 检查用服务 - 业务能力层
//!
//! 给运维人员直接查看上游响应：单页检索，或对一个检索词采集但不发布。

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::transport::SearchTransport;
use crate::models::{PageRequest, SearchResponse};
use crate::services::collection_engine::{Collection, CollectionEngine};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct InspectService {
    transport: Arc<dyn SearchTransport>,
    config: Config,
    cancel: CancellationToken,
}

impl InspectService {
    pub fn new(transport: Arc<dyn SearchTransport>, config: Config, cancel: CancellationToken) -> Self {
        Self {
            transport,
            config,
            cancel,
        }
    }

    /// 单页检索；检索词为空时不调用上游，返回空结果
    pub async fn search_single_page(
        &self,
        query: &str,
        display: Option<u32>,
        start: Option<u32>,
        sort: Option<String>,
    ) -> AppResult<SearchResponse> {
        if query.trim().is_empty() {
            return Ok(SearchResponse::empty());
        }
        let request = PageRequest {
            query: query.to_string(),
            display,
            start,
            sort,
        };
        self.transport.search(&request).await
    }

    /// 采集一个检索词但不发布；每次调用使用独立的引擎
    pub async fn collect_by_query(&self, query: &str, max_start: Option<u32>) -> AppResult<Collection> {
        let engine = CollectionEngine::from_config(self.transport.clone(), &self.config, self.cancel.child_token());
        engine.collect(query, max_start).await
    }
}
