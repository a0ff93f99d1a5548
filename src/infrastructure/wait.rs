//! 可取消的定时等待

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 等待结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

/// 等待 `duration`，期间收到取消信号则立即返回 `Cancelled`
///
/// 已经取消的 token 即使 `duration` 为 0 也返回 `Cancelled`。
pub async fn wait_or_cancel(duration: Duration, cancel: &CancellationToken) -> WaitOutcome {
    if cancel.is_cancelled() {
        return WaitOutcome::Cancelled;
    }
    if duration.is_zero() {
        return WaitOutcome::Elapsed;
    }
    tokio::select! {
        _ = cancel.cancelled() => WaitOutcome::Cancelled,
        _ = tokio::time::sleep(duration) => WaitOutcome::Elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn elapses_without_cancellation() {
        let token = CancellationToken::new();
        let started = tokio::time::Instant::now();
        assert_eq!(wait_or_cancel(Duration::from_secs(5), &token).await, WaitOutcome::Elapsed);
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_wait() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let outcome = wait_or_cancel(Duration::from_secs(60), &token).await;
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn already_cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(wait_or_cancel(Duration::ZERO, &token).await, WaitOutcome::Cancelled);
    }
}
