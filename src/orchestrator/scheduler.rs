//! 每日定时扫描
//!
//! 每天在配置的本地时间提交一次每日扫描（不指定上限），从不触发全量扫描。

use crate::infrastructure::wait::{wait_or_cancel, WaitOutcome};
use crate::orchestrator::job_runner::JobRunner;
use chrono::{Local, NaiveDateTime, NaiveTime};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// `now` 之后的下一个 `at` 时刻；恰好等于 `at` 时顺延到第二天
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

pub struct DailyScheduler {
    runner: JobRunner,
    at: NaiveTime,
    cancel: CancellationToken,
}

impl DailyScheduler {
    pub fn new(runner: JobRunner, at: NaiveTime, cancel: CancellationToken) -> Self {
        Self { runner, at, cancel }
    }

    /// 循环等待下一个触发时刻，直到收到取消信号
    pub async fn run(self) {
        info!("⏰ 每日扫描定时器已启动，触发时间 {}", self.at.format("%H:%M"));
        loop {
            let now = Local::now().naive_local();
            let next = next_run_after(now, self.at);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!("⏰ 下一次每日扫描: {}", next.format("%Y-%m-%d %H:%M"));

            if wait_or_cancel(wait, &self.cancel).await == WaitOutcome::Cancelled {
                info!("⏰ 定时器已停止");
                break;
            }
            drop(self.runner.submit_daily_scan(None));
        }
    }
}
