use async_trait::async_trait;
use book_collecting_worker::config::{Config, PartialResultPolicy};
use book_collecting_worker::error::{ApiError, AppError, AppResult};
use book_collecting_worker::infrastructure::{NaverClient, PublishTransport, SearchTransport};
use book_collecting_worker::models::{BookItem, PageRequest, SearchResponse};
use book_collecting_worker::orchestrator::BatchOrchestrator;
use book_collecting_worker::services::{CollectionEngine, RetryPolicy, StopReason};
use chrono::Weekday;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

type Script = Box<dyn Fn(&str, u32) -> AppResult<SearchResponse> + Send + Sync>;

/// 按脚本返回结果，并记录每次请求的 (query, start)
struct ScriptedSearch {
    script: Script,
    calls: Mutex<Vec<(String, u32)>>,
}

impl ScriptedSearch {
    fn new(script: impl Fn(&str, u32) -> AppResult<SearchResponse> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn starts_for(&self, query: &str) -> Vec<u32> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(q, _)| q == query)
            .map(|(_, start)| *start)
            .collect()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchTransport for ScriptedSearch {
    async fn search(&self, request: &PageRequest) -> AppResult<SearchResponse> {
        let start = request.start.unwrap_or(1);
        self.calls.lock().unwrap().push((request.query.clone(), start));
        (self.script)(&request.query, start)
    }
}

#[derive(Default)]
struct RecordingPublisher {
    batches: Mutex<Vec<Vec<BookItem>>>,
}

impl RecordingPublisher {
    fn published_titles(&self) -> Vec<String> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|item| item.title.clone())
            .collect()
    }
}

#[async_trait]
impl PublishTransport for RecordingPublisher {
    async fn publish(&self, items: &[BookItem]) -> AppResult<()> {
        self.batches.lock().unwrap().push(items.to_vec());
        Ok(())
    }
}

fn page(query: &str, start: u32, total: i64, display: i64, count: usize) -> AppResult<SearchResponse> {
    Ok(SearchResponse {
        last_build_date: None,
        total,
        start: i64::from(start),
        display,
        items: (0..count)
            .map(|i| BookItem {
                title: format!("{}-{}-{}", query, start, i),
                ..BookItem::default()
            })
            .collect(),
    })
}

fn throttled() -> AppResult<SearchResponse> {
    Err(AppError::rate_limited("/v1/search/book.json", None))
}

fn upstream_failure() -> AppResult<SearchResponse> {
    Err(AppError::Api(ApiError::BadResponse {
        endpoint: "/v1/search/book.json".into(),
        status: 500,
        body: "internal error".into(),
    }))
}

fn engine(transport: Arc<ScriptedSearch>, cancel: CancellationToken) -> CollectionEngine {
    CollectionEngine::new(transport, RetryPolicy::default(), 1000, cancel)
}

#[tokio::test(start_paused = true)]
async fn stops_once_the_next_start_passes_total() {
    let search = ScriptedSearch::new(|q, start| page(q, start, 150, 100, 100));
    let engine = engine(search.clone(), CancellationToken::new());

    let collection = assert_ok!(engine.collect("a", None).await);

    assert_eq!(search.starts_for("a"), vec![1, 101]);
    assert_eq!(collection.items.len(), 200);
    assert_eq!(collection.pages, 2);
    assert_eq!(collection.stop_reason, StopReason::TotalReached);
}

#[tokio::test(start_paused = true)]
async fn zero_display_stops_after_one_page() {
    let search = ScriptedSearch::new(|q, start| page(q, start, 5000, 0, 3));
    let engine = engine(search.clone(), CancellationToken::new());

    let collection = engine.collect("a", None).await.unwrap();

    assert_eq!(search.call_count(), 1);
    assert_eq!(collection.items.len(), 3);
    assert_eq!(collection.stop_reason, StopReason::PageSizeExhausted);
}

#[tokio::test(start_paused = true)]
async fn oversized_display_stops_without_overflow() {
    let search = ScriptedSearch::new(|q, start| page(q, start, 10, i64::MAX, 1));
    let engine = engine(search.clone(), CancellationToken::new());

    let collection = engine.collect("a", None).await.unwrap();

    assert_eq!(search.call_count(), 1);
    assert_eq!(collection.items.len(), 1);
    assert_eq!(collection.stop_reason, StopReason::PageSizeExhausted);
}

#[tokio::test(start_paused = true)]
async fn blank_query_never_reaches_the_transport() {
    let search = ScriptedSearch::new(|q, start| page(q, start, 10, 10, 10));
    let engine = engine(search.clone(), CancellationToken::new());

    for query in ["", "   "] {
        let collection = engine.collect(query, None).await.unwrap();
        assert!(collection.is_empty());
        assert_eq!(collection.stop_reason, StopReason::InvalidQuery);
    }
    assert_eq!(search.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn override_bounds_the_cursor() {
    let search = ScriptedSearch::new(|q, start| page(q, start, 100_000, 100, 100));
    let engine = engine(search.clone(), CancellationToken::new());

    let collection = engine.collect("a", Some(300)).await.unwrap();

    assert_eq!(search.starts_for("a"), vec![1, 101, 201]);
    assert_eq!(collection.stop_reason, StopReason::LimitReached);
}

#[tokio::test(start_paused = true)]
async fn three_throttles_return_partial_items_and_enter_slow_mode() {
    let search = ScriptedSearch::new(|q, start| if start == 1 { page(q, start, 1000, 100, 100) } else { throttled() });
    let engine = engine(search.clone(), CancellationToken::new());

    let before = tokio::time::Instant::now();
    let collection = engine.collect("a", None).await.unwrap();

    assert_eq!(search.starts_for("a"), vec![1, 101, 101, 101]);
    assert_eq!(collection.items.len(), 100);
    assert_eq!(collection.stop_reason, StopReason::Throttled);
    assert!(!collection.is_complete());
    // 2s + 4s + 8s 退避
    assert!(tokio::time::Instant::now() - before >= Duration::from_secs(14));

    let state = engine.rate_limit_state();
    assert_eq!(state.consecutive_throttles(), 3);
    assert!(state.is_slow_mode(tokio::time::Instant::now()));
    assert!(engine.next_request_delay() >= engine.policy().request_interval * 2);
}

#[tokio::test(start_paused = true)]
async fn success_resets_the_throttle_counter() {
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    let search = ScriptedSearch::new(move |q, start| {
        let mut n = counter.lock().unwrap();
        *n += 1;
        if *n == 1 {
            throttled()
        } else {
            page(q, start, 1, 100, 1)
        }
    });
    let engine = engine(search.clone(), CancellationToken::new());

    let collection = engine.collect("a", None).await.unwrap();

    assert_eq!(collection.items.len(), 1);
    assert_eq!(collection.stop_reason, StopReason::TotalReached);
    assert_eq!(engine.rate_limit_state().consecutive_throttles(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_mode_carries_over_to_the_next_query() {
    let search = ScriptedSearch::new(|q, start| if q == "a" { throttled() } else { page(q, start, 1, 100, 1) });
    let engine = engine(search.clone(), CancellationToken::new());

    let first = engine.collect("a", None).await.unwrap();
    assert_eq!(first.stop_reason, StopReason::Throttled);
    let deadline = engine.rate_limit_state().slow_mode_until();
    assert!(deadline.is_some());

    let second = engine.collect("b", None).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(engine.rate_limit_state().slow_mode_until(), deadline);
    assert!(engine.rate_limit_state().is_slow_mode(tokio::time::Instant::now()));
}

#[tokio::test(start_paused = true)]
async fn upstream_errors_are_not_retried() {
    let search = ScriptedSearch::new(|_, _| upstream_failure());
    let engine = engine(search.clone(), CancellationToken::new());

    let result = engine.collect("a", None).await;

    assert!(matches!(result, Err(AppError::Api(ApiError::BadResponse { status: 500, .. }))));
    assert_eq!(search.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_backoff_stops_the_query() {
    let search = ScriptedSearch::new(|_, _| throttled());
    let cancel = CancellationToken::new();
    let engine = engine(search.clone(), cancel.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
    });

    let collection = engine.collect("a", None).await.unwrap();
    canceller.await.unwrap();

    assert_eq!(collection.stop_reason, StopReason::Cancelled);
    assert_eq!(search.call_count(), 1);
}

fn orchestrator(
    search: Arc<ScriptedSearch>,
    publisher: Arc<RecordingPublisher>,
    policy: PartialResultPolicy,
) -> BatchOrchestrator {
    let mut config = Config::default();
    config.batch.partial_result_policy = policy;
    BatchOrchestrator::from_config(search, publisher, &config, CancellationToken::new())
}

/// "1" 第二页开始限流，"b" 上游报错，其余只有一页
fn mixed_script(q: &str, start: u32) -> AppResult<SearchResponse> {
    match (q, start) {
        ("1", 1) => page(q, start, 1000, 100, 2),
        ("1", _) => throttled(),
        ("b", _) => upstream_failure(),
        _ => page(q, start, 1, 100, 1),
    }
}

#[tokio::test(start_paused = true)]
async fn daily_scan_isolates_failures_and_publishes_partial_results() {
    let search = ScriptedSearch::new(mixed_script);
    let publisher = Arc::new(RecordingPublisher::default());
    let orchestrator = orchestrator(search.clone(), publisher.clone(), PartialResultPolicy::Publish);

    let report = orchestrator.daily_scan_for(Weekday::Mon, Some(200)).await;

    assert_eq!(report.queries_total, 9);
    assert_eq!(report.failed, 1);
    assert_eq!(report.partial, 1);
    assert_eq!(report.succeeded, 8);
    assert_eq!(report.discarded, 0);
    assert_eq!(report.items_published, 9);
    assert!(!report.cancelled);

    // 失败之后的检索词仍然被处理
    assert_eq!(search.starts_for("나"), vec![1]);
    assert!(publisher.published_titles().contains(&"1-1-0".to_string()));
}

#[tokio::test(start_paused = true)]
async fn discard_policy_drops_partial_results() {
    let search = ScriptedSearch::new(mixed_script);
    let publisher = Arc::new(RecordingPublisher::default());
    let orchestrator = orchestrator(search, publisher.clone(), PartialResultPolicy::Discard);

    let report = orchestrator.daily_scan_for(Weekday::Mon, Some(200)).await;

    assert_eq!(report.items_collected, 9);
    assert_eq!(report.items_published, 7);
    assert_eq!(report.succeeded, 7);
    assert_eq!(report.discarded, 1);
    assert_eq!(report.partial, 1);
    assert_eq!(report.processed(), report.queries_total);
    assert!(!publisher.published_titles().iter().any(|t| t.starts_with("1-")));
}

#[tokio::test(start_paused = true)]
async fn daily_scan_without_override_uses_the_daily_ceiling() {
    let search = ScriptedSearch::new(|q, start| page(q, start, 100_000, 100, 1));
    let publisher = Arc::new(RecordingPublisher::default());
    let orchestrator = orchestrator(search.clone(), publisher, PartialResultPolicy::Publish);

    let report = orchestrator.daily_scan_for(Weekday::Sun, None).await;

    assert_eq!(report.queries_total, 6);
    assert_eq!(search.starts_for("9"), vec![1, 101, 201]);
}

#[tokio::test(start_paused = true)]
async fn empty_results_are_not_published() {
    let search = ScriptedSearch::new(|q, start| page(q, start, 0, 100, 0));
    let publisher = Arc::new(RecordingPublisher::default());
    let orchestrator = orchestrator(search.clone(), publisher.clone(), PartialResultPolicy::Publish);

    let report = orchestrator.full_scan().await;

    assert_eq!(report.queries_total, 55);
    assert_eq!(report.empty, 55);
    assert_eq!(search.call_count(), 55);
    assert!(publisher.batches.lock().unwrap().is_empty());
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_live_naver_single_page() {
    // 需要 NAVER_CLIENT_ID / NAVER_CLIENT_SECRET
    let config = Config::from_env().expect("加载配置失败");
    let client = NaverClient::new(&config).expect("创建客户端失败");

    let response = client
        .search(&PageRequest::page("러스트", 1))
        .await
        .expect("调用 Naver API 失败");

    println!("total={} items={}", response.total, response.items.len());
    assert!(response.total >= 0);
}
