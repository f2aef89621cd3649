use std::{env, net::SocketAddr};

use anyhow::Result;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let addr: SocketAddr = env::var("MOCK_CONSOLE_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:9102".into())
        .parse()?;

    let handle = mock_console_server::spawn(addr).await?;
    tracing::info!(base_url = %handle.base_url(), "waiting for shutdown signal");
    let _ = signal::ctrl_c().await;

    tracing::info!("shutting down");
    handle.shutdown().await;
    Ok(())
}
