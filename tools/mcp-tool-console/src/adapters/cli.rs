use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::adapters::render::{StderrNotifier, render_detail, render_page, render_tool_detail};
use crate::adapters::repl;
use crate::app::backend::{ConsoleApi, ConsoleBackend};
use crate::app::detail_view::DetailController;
use crate::app::notify::Notifier;
use crate::domain::detail::{DetailTab, Merge};
use crate::infra::config::AppConfig;
use crate::infra::http::ConsoleHttp;
use crate::shared::error::ConsoleError;
use crate::shared::types::{EnableToolFavoriteParams, GetToolDetailParams, ListToolSquareParams};

#[derive(Parser, Debug)]
#[command(
    name = "mcp-tool-console",
    author,
    version,
    about = "Browse the tool square and debug MCP tool servers from a terminal."
)]
pub struct Cli {
    /// Console API base URL (overrides CONSOLE_API_BASE)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Bearer token sent with every request (overrides CONSOLE_API_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Request timeout in milliseconds (overrides CONSOLE_TIMEOUT_MS)
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List tools from the tool square
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        page_size: u32,
        /// Free-text search
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        order: Option<i32>,
        #[arg(long)]
        tag: Option<i64>,
    },
    /// Add a tool to favorites, or remove it with --remove
    Favorite {
        tool_id: String,
        #[arg(long)]
        remove: bool,
        /// The id refers to an MCP tool
        #[arg(long)]
        mcp: bool,
    },
    /// Show one tool from the tool square
    Detail {
        id: String,
        #[arg(long)]
        tag: Option<String>,
    },
    /// Show an MCP tool server with its tools and argument forms
    Server {
        id: String,
        #[arg(long, default_value = "tools")]
        tab: String,
    },
    /// Debug-run one tool of an MCP tool server
    Debug {
        id: String,
        tool: String,
        /// Tool argument NAME=VALUE (repeat flag)
        #[arg(long = "arg", value_parser = parse_arg)]
        args: Vec<(String, String)>,
    },
    /// Interactive session over one tool server
    Console { id: Option<String> },
}

fn parse_arg(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("argument must be NAME=VALUE"))?;
    Ok((key.to_string(), value.to_string()))
}

/// Run one command. Console failures are reported through the notifier and
/// turn into a failing exit code; only setup problems come back as `Err`.
pub async fn execute(cli: Cli, config: AppConfig) -> Result<ExitCode> {
    let settings = config.client_settings().context("resolve api settings")?;
    let http = ConsoleHttp::new(settings).context("build http client")?;
    let notifier: Arc<dyn Notifier> = Arc::new(StderrNotifier::new(cli.json));
    let api = Arc::new(ConsoleApi::new(http, notifier.clone()));
    let json = cli.json;

    match cli.command {
        Command::List {
            page,
            page_size,
            search,
            order,
            tag,
        } => {
            let params = ListToolSquareParams {
                page,
                page_size,
                content: search,
                order_flag: order,
                tags: tag,
            };
            match api.list_tool_square(&params).await {
                Ok(page) => emit(json, &page, || render_page(&page))?,
                Err(err) => return Ok(reported(notifier.as_ref(), &err)),
            }
        }
        Command::Favorite {
            tool_id,
            remove,
            mcp,
        } => {
            let params = EnableToolFavoriteParams {
                tool_id,
                favorite_flag: if remove { 1 } else { 0 },
                is_mcp: mcp,
            };
            match api.enable_tool_favorite(&params).await {
                Ok(result) => emit(json, &result, || format!("favorite updated ({result})\n"))?,
                Err(err) => return Ok(reported(notifier.as_ref(), &err)),
            }
        }
        Command::Detail { id, tag } => {
            // The wrapper reports its own failures.
            match api.get_tool_detail(&GetToolDetailParams { id, tag }).await {
                Ok(detail) => emit(json, &detail, || render_tool_detail(&detail))?,
                Err(_) => return Ok(ExitCode::FAILURE),
            }
        }
        Command::Server { id, tab } => {
            let tab = DetailTab::parse(&tab).ok_or_else(|| anyhow!("unknown tab '{tab}'"))?;
            let controller = DetailController::new(api, notifier.clone());
            if !controller.select_tab(tab) {
                notifier.error(&format!("the {} tab is not available", tab.as_str()));
                return Ok(ExitCode::FAILURE);
            }
            if controller.load(&id).await.is_err() {
                return Ok(ExitCode::FAILURE);
            }
            let tool_count = controller.with_view(|view| {
                view.record().map(|record| record.tools.len()).unwrap_or(0)
            });
            for index in 0..tool_count {
                controller.set_tool_open(index, true);
            }
            if json {
                let record = controller.with_view(|view| view.record().cloned());
                emit(true, &record, String::new)?;
            } else {
                print!("{}", controller.with_view(render_detail));
            }
        }
        Command::Debug { id, tool, args } => {
            let controller = DetailController::new(api, notifier.clone());
            if controller.load(&id).await.is_err() {
                return Ok(ExitCode::FAILURE);
            }
            let tool_index = match prepare_debug(&controller, &tool, &args) {
                Ok(index) => index,
                Err(PrepareError::Reported) => return Ok(ExitCode::FAILURE),
                Err(PrepareError::Unreported(err)) => {
                    return Ok(reported(notifier.as_ref(), &err));
                }
            };
            match controller.run_debug(tool_index).await {
                Ok(Merge::Applied) => {
                    let tool = controller.with_view(|view| view.tool(tool_index).cloned());
                    let text = tool
                        .as_ref()
                        .and_then(|tool| tool.text_result.clone())
                        .unwrap_or_default();
                    emit(json, &tool, || format!("{text}\n"))?;
                }
                Ok(Merge::Stale) | Err(_) => return Ok(ExitCode::FAILURE),
            }
        }
        Command::Console { id } => {
            let metrics_cfg = config.metrics_server_config()?;
            let controller = DetailController::new(api, notifier);
            repl::run_console(controller, id, metrics_cfg).await?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

enum PrepareError {
    Reported,
    Unreported(ConsoleError),
}

/// Resolve the tool by name and fill its arguments from NAME=VALUE pairs.
fn prepare_debug<B: ConsoleBackend>(
    controller: &DetailController<B>,
    tool: &str,
    args: &[(String, String)],
) -> std::result::Result<usize, PrepareError> {
    let (tool_index, names) = controller
        .with_view(|view| {
            let record = view.record()?;
            let index = record.tools.iter().position(|t| t.name == tool)?;
            let names: Vec<String> = record.tools[index]
                .args
                .iter()
                .map(|arg| arg.name.clone())
                .collect();
            Some((index, names))
        })
        .ok_or_else(|| {
            PrepareError::Unreported(ConsoleError::invalid_argument(
                tool,
                "no such tool on this server",
            ))
        })?;

    for (name, value) in args {
        let arg_index = names.iter().position(|n| n == name).ok_or_else(|| {
            PrepareError::Unreported(ConsoleError::invalid_argument(
                name,
                format!("tool '{tool}' has no such argument"),
            ))
        })?;
        controller
            .set_arg_text(tool_index, arg_index, value)
            .map_err(|_| PrepareError::Reported)?;
    }
    controller.set_tool_open(tool_index, true);
    Ok(tool_index)
}

fn reported(notifier: &dyn Notifier, err: &ConsoleError) -> ExitCode {
    notifier.error(&err.to_string());
    ExitCode::FAILURE
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("encode json output")?
        );
    } else {
        print!("{}", text());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_debug_arguments() {
        let cli = Cli::try_parse_from([
            "mcp-tool-console",
            "--api-base",
            "http://localhost:1",
            "debug",
            "srv-1",
            "add",
            "--arg",
            "numbers=[1,2]",
            "--arg",
            "note=a=b",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.api_base.as_deref(), Some("http://localhost:1"));
        match cli.command {
            Command::Debug { id, tool, args } => {
                assert_eq!(id, "srv-1");
                assert_eq!(tool, "add");
                assert_eq!(
                    args,
                    vec![
                        ("numbers".to_string(), "[1,2]".to_string()),
                        ("note".to_string(), "a=b".to_string())
                    ]
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn argument_without_equals_is_rejected() {
        let parsed = Cli::try_parse_from(["mcp-tool-console", "debug", "s", "t", "--arg", "oops"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn list_defaults_to_first_page() {
        let cli = Cli::try_parse_from(["mcp-tool-console", "list"]).unwrap();
        match cli.command {
            Command::List {
                page, page_size, ..
            } => {
                assert_eq!((page, page_size), (1, 20));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
