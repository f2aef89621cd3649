//! Interactive console session over the detail panel.
//!
//! Fetches and debug runs are spawned so the prompt keeps accepting
//! commands while requests are in flight.

use anyhow::{Context, Result, anyhow};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::adapters::render::render_detail;
use crate::app::backend::ConsoleBackend;
use crate::app::detail_view::DetailController;
use crate::domain::detail::{DetailTab, Merge};
use crate::infra::metrics::{self, MetricsServerConfig};

const HELP: &str = "\
commands:
  load <id>            fetch a tool server
  tab <content|tools>  switch tab
  open <tool>          expand a tool form
  close <tool>         collapse a tool form
  set <tool> <arg> <value...>
  run <tool>           debug-run a tool with its current arguments
  show                 print the panel
  disable-test         block runs
  enable-test          allow runs
  clear                drop the loaded server
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Load(String),
    Tab(DetailTab),
    Open(usize),
    Close(usize),
    Set {
        tool: usize,
        arg: usize,
        value: String,
    },
    Run(usize),
    Show,
    DisableTest,
    EnableTest,
    Clear,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let command = match verb {
        "load" => {
            if rest.is_empty() {
                return Err(anyhow!("usage: load <id>"));
            }
            ConsoleCommand::Load(rest.to_string())
        }
        "tab" => {
            let tab = DetailTab::parse(rest).ok_or_else(|| anyhow!("unknown tab '{rest}'"))?;
            ConsoleCommand::Tab(tab)
        }
        "open" => ConsoleCommand::Open(parse_index(rest, "tool")?),
        "close" => ConsoleCommand::Close(parse_index(rest, "tool")?),
        "run" => ConsoleCommand::Run(parse_index(rest, "tool")?),
        "set" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let tool = parse_index(parts.next().unwrap_or_default(), "tool")?;
            let arg = parse_index(parts.next().unwrap_or_default(), "arg")?;
            let value = parts.next().unwrap_or_default().to_string();
            ConsoleCommand::Set { tool, arg, value }
        }
        "show" => ConsoleCommand::Show,
        "disable-test" => ConsoleCommand::DisableTest,
        "enable-test" => ConsoleCommand::EnableTest,
        "clear" => ConsoleCommand::Clear,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(anyhow!("unknown command '{other}', try 'help'")),
    };
    Ok(Some(command))
}

fn parse_index(raw: &str, what: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .with_context(|| format!("expected a {what} index, got '{raw}'"))
}

pub async fn run_console<B: ConsoleBackend>(
    controller: DetailController<B>,
    initial: Option<String>,
    metrics_cfg: Option<MetricsServerConfig>,
) -> Result<()> {
    if let Some(metrics_cfg) = metrics_cfg {
        if metrics_cfg.allow_insecure && metrics_cfg.tls.is_none() {
            warn!(
                addr = %metrics_cfg.addr,
                "metrics server running without TLS (dev override)"
            );
        } else if metrics_cfg.auth_token.is_none() {
            warn!(
                addr = %metrics_cfg.addr,
                "metrics auth token missing; set METRICS_AUTH_TOKEN for production"
            );
        }
        metrics::spawn_metrics_server(metrics_cfg).await;
    }

    if let Some(id) = initial {
        spawn_load(&controller, id);
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("read console input")? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{err:#}");
                continue;
            }
        };
        if !dispatch(&controller, command) {
            break;
        }
    }
    info!("console session finished");
    Ok(())
}

/// Apply one command. Returns false when the session should end.
fn dispatch<B: ConsoleBackend>(controller: &DetailController<B>, command: ConsoleCommand) -> bool {
    match command {
        ConsoleCommand::Load(id) => spawn_load(controller, id),
        ConsoleCommand::Tab(tab) => {
            if controller.select_tab(tab) {
                show(controller);
            } else {
                eprintln!("the {} tab is not available", tab.as_str());
            }
        }
        ConsoleCommand::Open(tool) => {
            controller.set_tool_open(tool, true);
            show(controller);
        }
        ConsoleCommand::Close(tool) => {
            controller.set_tool_open(tool, false);
            show(controller);
        }
        ConsoleCommand::Set { tool, arg, value } => {
            // Parse failures are already reported by the controller.
            if let Ok(false) = controller.set_arg_text(tool, arg, &value) {
                eprintln!("no argument ({arg}) on tool [{tool}]");
            }
        }
        ConsoleCommand::Run(tool) => {
            let controller = controller.clone();
            tokio::spawn(async move {
                if let Ok(Merge::Applied) = controller.run_debug(tool).await {
                    show(&controller);
                }
            });
        }
        ConsoleCommand::Show => show(controller),
        ConsoleCommand::DisableTest => controller.set_test_disabled(true),
        ConsoleCommand::EnableTest => controller.set_test_disabled(false),
        ConsoleCommand::Clear => controller.clear(),
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => return false,
    }
    true
}

fn spawn_load<B: ConsoleBackend>(controller: &DetailController<B>, id: String) {
    let controller = controller.clone();
    tokio::spawn(async move {
        if let Ok(Merge::Applied) = controller.load(&id).await {
            show(&controller);
        }
    });
}

fn show<B: ConsoleBackend>(controller: &DetailController<B>) {
    print!("{}", controller.with_view(render_detail));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("load srv-1", ConsoleCommand::Load("srv-1".into()))]
    #[case("tab tools", ConsoleCommand::Tab(DetailTab::Tools))]
    #[case("open 2", ConsoleCommand::Open(2))]
    #[case("close 0", ConsoleCommand::Close(0))]
    #[case("run 1", ConsoleCommand::Run(1))]
    #[case("disable-test", ConsoleCommand::DisableTest)]
    #[case("quit", ConsoleCommand::Quit)]
    fn parses_commands(#[case] line: &str, #[case] expected: ConsoleCommand) {
        assert_eq!(parse_command(line).unwrap(), Some(expected));
    }

    #[test]
    fn set_keeps_the_rest_of_the_line() {
        assert_eq!(
            parse_command("set 0 1 [1, 2, 3]").unwrap(),
            Some(ConsoleCommand::Set {
                tool: 0,
                arg: 1,
                value: "[1, 2, 3]".into()
            })
        );
    }

    #[rstest]
    #[case("load")]
    #[case("open x")]
    #[case("tab nowhere")]
    #[case("frobnicate")]
    fn rejects_bad_input(#[case] line: &str) {
        assert!(parse_command(line).is_err());
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_command("   ").unwrap(), None);
    }
}
