//! 限流状态
//!
//! 属于单个 `CollectionEngine`，在一次批处理的所有检索词之间共享，不随检索词重置。

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

/// 连续限流次数与慢速模式截止时间
#[derive(Debug, Default)]
pub struct RateLimitState {
    consecutive_throttles: AtomicU32,
    slow_mode_until: Mutex<Option<Instant>>,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次限流，返回累计的连续次数
    pub fn record_throttle(&self) -> u32 {
        self.consecutive_throttles.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// 任意一次非限流的成功响应都会清零
    pub fn record_success(&self) {
        self.consecutive_throttles.store(0, Ordering::SeqCst);
    }

    pub fn consecutive_throttles(&self) -> u32 {
        self.consecutive_throttles.load(Ordering::SeqCst)
    }

    /// 把慢速模式延长到 `until`；截止时间只会向后移动
    pub fn extend_slow_mode(&self, until: Instant) {
        let mut guard = self.slow_mode_until.lock().unwrap_or_else(|e| e.into_inner());
        if guard.map_or(true, |current| until > current) {
            *guard = Some(until);
        }
    }

    pub fn slow_mode_until(&self) -> Option<Instant> {
        *self.slow_mode_until.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_slow_mode(&self, now: Instant) -> bool {
        self.slow_mode_until().map_or(false, |until| now < until)
    }
}
