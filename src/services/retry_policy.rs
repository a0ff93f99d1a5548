//! 限流重试策略
//!
//! 只负责计算：第几次重试等多久、何时进入慢速模式、请求间隔如何抖动。
//! 不做任何 I/O，便于单独测试。

use crate::config::{RetryConfig, SearchConfig};
use rand::Rng;
use std::time::Duration;

/// 重试与请求节奏策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 单页请求最多尝试次数（含第一次）
    pub max_attempts: u32,
    /// 第一次退避时长，之后每次翻倍
    pub base_backoff: Duration,
    /// 连续限流多少次后进入慢速模式
    pub slow_mode_threshold: u32,
    pub slow_mode_duration: Duration,
    /// 慢速模式下请求间隔的倍数
    pub slow_mode_multiplier: u32,
    /// 相邻请求之间的基础间隔
    pub request_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default(), &SearchConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(retry: &RetryConfig, search: &SearchConfig) -> Self {
        Self {
            max_attempts: retry.max_attempts.max(1),
            base_backoff: Duration::from_millis(retry.base_backoff_ms),
            slow_mode_threshold: retry.slow_mode_threshold,
            slow_mode_duration: Duration::from_millis(retry.slow_mode_duration_ms),
            slow_mode_multiplier: retry.slow_mode_multiplier.max(1),
            request_interval: Duration::from_millis(search.request_interval_ms),
        }
    }

    /// 第 `attempt` 次（从 1 开始）限流后的退避时长：base, 2·base, 4·base, …
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    /// 本次限流后是否已用完重试次数
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }

    pub fn should_enter_slow_mode(&self, consecutive_throttles: u32) -> bool {
        consecutive_throttles >= self.slow_mode_threshold
    }

    /// 抖动上限：基础间隔的 1/6，至少 1ms
    pub fn jitter_bound(&self) -> Duration {
        (self.request_interval / 6).max(Duration::from_millis(1))
    }

    /// 在 `[0, jitter_bound]` 内均匀取一个抖动值
    pub fn sample_jitter(&self) -> Duration {
        let bound = self.jitter_bound().as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=bound))
    }

    /// 请求间隔 = (基础间隔 + 抖动) × (慢速模式 ? 倍数 : 1)；基础间隔为 0 时不等待
    pub fn pacing_delay(&self, jitter: Duration, slow_mode: bool) -> Duration {
        if self.request_interval.is_zero() {
            return Duration::ZERO;
        }
        let delay = self.request_interval + jitter.min(self.jitter_bound());
        if slow_mode {
            delay.saturating_mul(self.slow_mode_multiplier)
        } else {
            delay
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            request_interval: Duration::from_millis(300),
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn backoff_doubles_from_two_seconds() {
        let policy = policy();
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn exhaustion_and_slow_mode_thresholds() {
        let policy = policy();
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
        assert!(!policy.should_enter_slow_mode(2));
        assert!(policy.should_enter_slow_mode(3));
    }

    #[test]
    fn jitter_stays_within_a_sixth_of_the_interval() {
        let policy = policy();
        assert_eq!(policy.jitter_bound(), Duration::from_millis(50));
        for _ in 0..200 {
            assert!(policy.sample_jitter() <= Duration::from_millis(50));
        }
    }

    #[test]
    fn slow_mode_doubles_the_pacing_delay() {
        let policy = policy();
        let normal = policy.pacing_delay(Duration::from_millis(20), false);
        let slow = policy.pacing_delay(Duration::from_millis(20), true);
        assert_eq!(normal, Duration::from_millis(320));
        assert_eq!(slow, Duration::from_millis(640));
        assert!(policy.pacing_delay(Duration::ZERO, true) >= policy.request_interval * 2);
    }

    #[test]
    fn zero_interval_disables_pacing() {
        let policy = RetryPolicy {
            request_interval: Duration::ZERO,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.pacing_delay(Duration::from_millis(5), true), Duration::ZERO);
    }
}
