use std::sync::Arc;

use anyhow::{Context, Result};
use mcp_tool_console::{
    app::{
        backend::{ConsoleApi, ConsoleBackend},
        notify::RecordingNotifier,
    },
    infra::{config::AppConfig, http::ConsoleHttp},
    shared::types::ListToolSquareParams,
};

/// Hits a running console backend: lists the first page of the tool square
/// and, when SMOKE_SERVER_ID is set, fetches that tool server.
#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    let settings = config.client_settings()?;
    println!("api_base={}", settings.base_url);

    let http = ConsoleHttp::new(settings).context("build http client")?;
    let notifier = Arc::new(RecordingNotifier::new());
    let api = ConsoleApi::new(http, notifier.clone());

    let page = api
        .list_tool_square(&ListToolSquareParams::default())
        .await
        .context("list tool square")?;
    println!(
        "tools_count={} names={:?}",
        page.total_count,
        page.page_data.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
    );

    if let Ok(id) = std::env::var("SMOKE_SERVER_ID") {
        let detail = api
            .get_server_tool_detail(&id)
            .await
            .with_context(|| format!("fetch tool server {id}"))?;
        println!(
            "server={} tools={:?}",
            detail.name,
            detail.tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
        );
    }

    Ok(())
}
