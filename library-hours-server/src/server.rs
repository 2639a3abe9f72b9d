use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Result;
use library_hours_core::source::SheetSource;
use tokio::net::TcpListener;

use crate::handlers::create_app;

pub async fn start_server(source: Arc<dyn SheetSource>) -> Result<()> {
    let app = create_app(source);

    // 从环境变量获取端口，默认为3000
    let port = env::var("PORT")
        .ok()
        .and_then(|port| port.parse::<u16>().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("Library Hours Server starting on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
