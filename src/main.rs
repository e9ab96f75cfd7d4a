//! Unified Gateway 服务主入口

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unified_gateway::{Config, Gateway, GatewayContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志 - 默认INFO等级
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unified_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 启动 Unified Gateway 服务");

    // 加载配置（内部会先读取 .env）
    let config = Config::load()?;
    info!("✅ 配置加载成功");

    let context = GatewayContext::build(config)?;
    let mut gateway = Gateway::new(context);
    gateway.start().await?;

    if let Some(addr) = gateway.local_addr() {
        info!("📖 健康检查: http://{}/health", addr);
    }

    tokio::signal::ctrl_c().await?;
    info!("🛑 接收到关闭信号");

    gateway.stop().await?;
    Ok(())
}
