mod cache;
mod handlers;
mod server;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "library_hours_server=info,library_hours_core=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 初始化数据源
    let source = match handlers::source_from_env().await {
        Ok(source) => source,
        Err(e) => {
            tracing::error!("Failed to initialize sheet source: {}", e);
            return Err(e.into());
        }
    };

    // 启动服务器
    server::start_server(source).await
}
