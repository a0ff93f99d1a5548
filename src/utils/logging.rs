//! 日志工具模块
//!
//! 初始化 tracing 订阅器，并提供日志格式化的辅助函数

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// 运行期调整日志级别的句柄
///
/// 配置文件在日志初始化之后才读取，读完后再按配置切换级别。
pub struct LogLevelHandle(reload::Handle<EnvFilter, Registry>);

impl LogLevelHandle {
    /// 按 `verbose` 重新设置过滤器；`RUST_LOG` 仍然优先
    pub fn set_verbose(&self, verbose: bool) {
        let _ = self.0.reload(build_filter(verbose));
    }
}

/// 初始化日志
///
/// 优先使用 `RUST_LOG`；未设置时按 `verbose` 选择 debug 或 info。
/// 重复调用不会报错（测试中可能多次初始化）。
///
/// # 参数
/// - `verbose`: 是否输出 debug 日志
pub fn init(verbose: bool) -> LogLevelHandle {
    let (filter, handle) = reload::Layer::new(build_filter(verbose));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();

    LogLevelHandle(handle)
}

fn build_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,book_collecting_worker={}", default_level)))
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_and_reload_do_not_panic() {
        let first = init(false);
        first.set_verbose(true);
        let second = init(true);
        second.set_verbose(false);
    }

    #[test]
    fn truncates_by_characters_not_bytes() {
        assert_eq!(truncate_text("가나다라", 2), "가나...");
        assert_eq!(truncate_text("abc", 5), "abc");
    }
}
