use anyhow::{Context, Result};
use book_collecting_worker::utils::logging;
use book_collecting_worker::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志（配置加载前，级别稍后按配置调整）
    let log_level = logging::init(false);

    // 加载配置
    let config = Config::load().context("加载配置失败")?;
    log_level.set_verbose(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
