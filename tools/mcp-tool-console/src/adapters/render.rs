use std::fmt::Write as _;

use serde_json::Value;

use crate::app::notify::Notifier;
use crate::domain::detail::{DetailTab, DetailView, ToolDescriptor};
use crate::domain::schema::{ArgDescriptor, FormControl};
use crate::shared::types::{Page, ToolDetail, ToolSummary};
use crate::shared::utils::format_create_time;

const TABS: [DetailTab; 3] = [DetailTab::Content, DetailTab::Tools, DetailTab::Overview];

/// Prints notifications on stderr so stdout stays parseable.
pub struct StderrNotifier {
    json: bool,
}

impl StderrNotifier {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl Notifier for StderrNotifier {
    fn error(&self, message: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": message }));
        } else {
            eprintln!("error: {message}");
        }
    }
}

pub fn render_page(page: &Page<ToolSummary>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "page {} of {} ({} tools)",
        page.page, page.total_pages, page.total_count
    );
    for tool in &page.page_data {
        let star = if tool.is_favorite { "*" } else { " " };
        let kind = if tool.is_mcp { "mcp" } else { "api" };
        let _ = writeln!(
            out,
            "{star} {:<24} {:<4} {:>5}  {}",
            tool.id,
            kind,
            tool.favorite_count,
            tool.name
        );
        if let Some(description) = tool.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "    {description}");
        }
    }
    out
}

pub fn render_tool_detail(detail: &ToolDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", detail.name, detail.id);
    if let Some(description) = &detail.description {
        let _ = writeln!(out, "{description}");
    }
    if let Some(address) = &detail.address {
        let _ = writeln!(out, "address: {address}");
    }
    let _ = writeln!(
        out,
        "favorite: {}  used: {}",
        if detail.is_favorite { "yes" } else { "no" },
        detail.usage_count
    );
    if let Some(published) = detail.create_time.as_ref().and_then(format_create_time) {
        let _ = writeln!(out, "published at {published}");
    }
    out
}

/// Text rendering of the detail panel.
pub fn render_detail(view: &DetailView) -> String {
    let mut out = String::new();
    let Some(record) = view.record() else {
        match view.selected_id() {
            Some(id) => {
                let _ = writeln!(out, "loading {id}...");
            }
            None => {
                let _ = writeln!(out, "no tool server loaded");
            }
        }
        return out;
    };

    let _ = writeln!(out, "{} ({})", record.name, record.id);
    if let Some(brief) = record.brief.as_deref().filter(|b| !b.is_empty()) {
        let _ = writeln!(out, "{brief}");
    }
    if let Some(published) = record.create_time.as_ref().and_then(format_create_time) {
        let _ = writeln!(out, "published at {published}");
    }
    if let Some(url) = &record.server_url {
        let _ = writeln!(out, "server: {url}");
    }
    let _ = writeln!(out, "{}", tab_bar(view.tab()));
    let _ = writeln!(out);

    match view.tab() {
        DetailTab::Content => {
            let text = record.content.as_deref().unwrap_or("(no content)");
            let _ = writeln!(out, "{text}");
        }
        DetailTab::Overview => {
            let text = record.overview.as_deref().unwrap_or("(no overview)");
            let _ = writeln!(out, "{text}");
        }
        DetailTab::Tools => {
            if record.tools.is_empty() {
                let _ = writeln!(out, "(no tools)");
            }
            for (index, tool) in record.tools.iter().enumerate() {
                render_tool(&mut out, index, tool, view.can_run(index));
            }
        }
    }
    out
}

fn tab_bar(active: DetailTab) -> String {
    TABS.iter()
        .map(|tab| {
            if *tab == active {
                format!("[{}]", tab.as_str())
            } else if !tab.is_enabled() {
                format!("{} (disabled)", tab.as_str())
            } else {
                tab.as_str().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn render_tool(out: &mut String, index: usize, tool: &ToolDescriptor, runnable: bool) {
    let marker = if tool.open { "v" } else { ">" };
    let state = if tool.loading {
        "running"
    } else if runnable {
        "ready"
    } else {
        "disabled"
    };
    let _ = writeln!(out, "{marker} [{index}] {} ({state})", tool.name);
    if let Some(description) = tool.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "    {description}");
    }
    if !tool.open {
        return;
    }
    for (arg_index, arg) in tool.args.iter().enumerate() {
        render_arg(out, arg_index, arg);
    }
    if let Some(result) = &tool.text_result {
        let _ = writeln!(out, "    output:");
        for line in result.lines() {
            let _ = writeln!(out, "      {line}");
        }
    }
}

fn render_arg(out: &mut String, index: usize, arg: &ArgDescriptor) {
    let required = if arg.required { "*" } else { "" };
    let control = match FormControl::for_arg(arg) {
        Some(FormControl::Select { options }) => format!("select: {}", options.join("|")),
        Some(control) => control.label().to_string(),
        None => format!("unsupported type {}", arg.arg_type.as_str()),
    };
    let _ = write!(
        out,
        "    ({index}) {required}{} [{control}] = {}",
        arg.name,
        display_value(&arg.value)
    );
    if let Some(description) = arg.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = write!(out, "  # {description}");
    }
    let _ = writeln!(out);
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => format!("{text:?}"),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
