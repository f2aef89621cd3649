use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use mcp_tool_console::{
    adapters::cli::{self, Cli},
    infra::config::AppConfig,
};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // stdout carries command output; logs go to stderr
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut config = AppConfig::load().context("load configuration")?;
    config.apply_cli_overrides(cli.api_base.clone(), cli.token.clone(), cli.timeout_ms);
    tracing::debug!(api_base = ?config.api_base_url, "configuration loaded");

    cli::execute(cli, config).await
}
