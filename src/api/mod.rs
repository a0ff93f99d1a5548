//! HTTP 接口
//!
//! - `POST /internal/naver/collect/full-scan` - 提交全量扫描
//! - `POST /internal/naver/collect/daily-scan?maxStart=N` - 提交每日扫描
//! - `GET /api/naver/inspect/single` - 单页检索
//! - `GET /api/naver/inspect/collect` - 采集但不发布
//! - `GET /health`

pub mod handlers;

use crate::orchestrator::JobRunner;
use crate::services::InspectService;
use axum::routing::{get, post};
use axum::{Extension, Router};
use handlers::{
    handle_daily_scan, handle_full_scan, handle_inspect_collect, handle_inspect_single, health,
};
use std::sync::Arc;

pub fn router(runner: JobRunner, inspect: Arc<InspectService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/internal/naver/collect/full-scan", post(handle_full_scan))
        .route("/internal/naver/collect/daily-scan", post(handle_daily_scan))
        .route("/api/naver/inspect/single", get(handle_inspect_single))
        .route("/api/naver/inspect/collect", get(handle_inspect_collect))
        .layer(Extension(runner))
        .layer(Extension(inspect))
}
