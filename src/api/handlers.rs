//! HTTP 处理函数
//!
//! 触发接口只负责提交任务并立即返回 202，执行结果只写日志。

use crate::models::{BookItem, SearchResponse};
use crate::orchestrator::JobRunner;
use crate::services::InspectService;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// 检查用采集的默认 start 上限（只取第一页）
pub const DEFAULT_INSPECT_MAX_START: u32 = 3;

#[derive(Debug, Deserialize)]
pub struct DailyScanParams {
    #[serde(rename = "maxStart")]
    pub max_start: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct InspectSingleParams {
    #[serde(default)]
    pub query: String,
    pub display: Option<u32>,
    pub start: Option<u32>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InspectCollectParams {
    #[serde(default)]
    pub query: String,
    #[serde(rename = "maxStart")]
    pub max_start: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub job: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectResponse {
    pub query: String,
    pub pages: u32,
    pub item_count: usize,
    pub complete: bool,
    pub stop_reason: String,
    pub items: Vec<BookItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn accepted(job: &str) -> (StatusCode, Json<AcceptedResponse>) {
    (
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            job: job.to_string(),
            status: "accepted".to_string(),
        }),
    )
}

fn bad_gateway(err: impl std::fmt::Display) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn handle_full_scan(Extension(runner): Extension<JobRunner>) -> (StatusCode, Json<AcceptedResponse>) {
    info!("📨 收到全量扫描请求");
    drop(runner.submit_full_scan());
    accepted("full-scan")
}

pub async fn handle_daily_scan(
    Query(params): Query<DailyScanParams>,
    Extension(runner): Extension<JobRunner>,
) -> (StatusCode, Json<AcceptedResponse>) {
    info!("📨 收到每日扫描请求 maxStart={:?}", params.max_start);
    drop(runner.submit_daily_scan(params.max_start));
    accepted("daily-scan")
}

pub async fn handle_inspect_single(
    Query(params): Query<InspectSingleParams>,
    Extension(inspect): Extension<Arc<InspectService>>,
) -> Response {
    match inspect
        .search_single_page(&params.query, params.display, params.start, params.sort)
        .await
    {
        Ok(response) => (StatusCode::OK, Json::<SearchResponse>(response)).into_response(),
        Err(e) => {
            error!("❌ 单页检索失败: query='{}' error={}", params.query, e);
            bad_gateway(e)
        }
    }
}

pub async fn handle_inspect_collect(
    Query(params): Query<InspectCollectParams>,
    Extension(inspect): Extension<Arc<InspectService>>,
) -> Response {
    let max_start = params.max_start.unwrap_or(DEFAULT_INSPECT_MAX_START);
    match inspect.collect_by_query(&params.query, Some(max_start)).await {
        Ok(collection) => {
            let body = CollectResponse {
                complete: collection.is_complete(),
                stop_reason: format!("{:?}", collection.stop_reason),
                item_count: collection.items.len(),
                pages: collection.pages,
                query: collection.query,
                items: collection.items,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!("❌ 检查采集失败: query='{}' error={}", params.query, e);
            bad_gateway(e)
        }
    }
}
