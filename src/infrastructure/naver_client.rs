//! 네이버 책 검색 API 客户端
//!
//! 封装 `/v1/search/book.json` 的调用，未指定的分页参数按配置补全。

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::infrastructure::transport::SearchTransport;
use crate::models::{PageRequest, SearchResponse};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

const SEARCH_PATH: &str = "/v1/search/book.json";

/// 네이버 검색 客户端
#[derive(Clone)]
pub struct NaverClient {
    http: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    default_display: u32,
    default_sort: String,
}

impl NaverClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.naver.timeout_secs))
            .build()
            .map_err(|e| AppError::api_request_failed(&config.naver.base_url, e))?;

        Ok(Self {
            http,
            base_url: config.naver.base_url.trim_end_matches('/').to_string(),
            client_id: config.naver.client_id.clone(),
            client_secret: config.naver.client_secret.clone(),
            default_display: config.search.display,
            default_sort: config.search.sort.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, SEARCH_PATH)
    }

    /// 从 429 响应中提取 Retry-After（秒）
    fn retry_after(response: &reqwest::Response) -> Option<u64> {
        response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }
}

#[async_trait]
impl SearchTransport for NaverClient {
    async fn search(&self, request: &PageRequest) -> AppResult<SearchResponse> {
        let page_size = request.display.unwrap_or(self.default_display);
        let start = request.start.unwrap_or(1);
        let sort = request.sort.as_deref().unwrap_or(&self.default_sort);
        let endpoint = self.endpoint();

        debug!("调用 Naver API: query='{}' start={} display={} sort={}", request.query, start, page_size, sort);

        let display_param = page_size.to_string();
        let start_param = start.to_string();
        let response = self
            .http
            .get(&endpoint)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .query(&[
                ("query", request.query.as_str()),
                ("display", display_param.as_str()),
                ("start", start_param.as_str()),
                ("sort", sort),
            ])
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::rate_limited(endpoint, Self::retry_after(&response)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api(ApiError::BadResponse {
                endpoint,
                status: status.as_u16(),
                body,
            }));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;
        let page: SearchResponse = serde_json::from_str(&body)?;

        info!(
            "Naver API call. query='{}' start={} display={} itemCount={}",
            request.query,
            start,
            page_size,
            page.items.len()
        );
        Ok(page)
    }
}
