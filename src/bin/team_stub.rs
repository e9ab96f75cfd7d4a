//! 团队服务桩入口
//!
//! 用同一个组件启动任意团队微服务：`team-stub --name design-team --port 4001`

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unified_gateway::business::services::TeamStub;

#[derive(Debug, Parser)]
#[command(name = "team-stub", about = "团队微服务桩")]
struct Args {
    /// 团队名称
    #[arg(long)]
    name: String,

    /// 监听端口
    #[arg(long, default_value_t = 4000)]
    port: u16,

    /// 监听地址
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unified_gateway=info,team_stub=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenv::dotenv().ok();
    let args = Args::parse();

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", args.host, args.port)).await?;
    info!("🧩 团队服务 {} 启动，监听 {}", args.name, listener.local_addr()?);

    let app = TeamStub::with_default_template(args.name).router();
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("🛑 团队服务关闭");
        })
        .await?;

    Ok(())
}
