//! In-memory state of the tool server detail panel.
//!
//! Every response that lands here carries the generation it was issued
//! under. `begin_fetch` and `clear` advance the generation, so a response
//! for a superseded selection is recognised and dropped instead of
//! overwriting newer state. A tool runs at most once at a time, and no run
//! starts while a newly selected server is still loading.

use serde::Serialize;
use serde_json::Value;

use crate::domain::schema::{ArgDescriptor, build_tool_args, transform_schema};
use crate::shared::{
    error::ConsoleError,
    types::{CreateTime, DebugToolRequest, DebugToolResponse, ServerToolDetail},
};

#[derive(Debug, Clone, Serialize)]
pub struct ToolServerRecord {
    pub id: String,
    pub name: String,
    pub brief: Option<String>,
    pub content: Option<String>,
    pub overview: Option<String>,
    pub logo_url: Option<String>,
    pub mcp_type: Option<String>,
    pub server_url: Option<String>,
    pub create_time: Option<CreateTime>,
    pub tools: Vec<ToolDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub args: Vec<ArgDescriptor>,
    pub open: bool,
    pub loading: bool,
    pub text_result: Option<String>,
}

impl ToolServerRecord {
    pub fn from_wire(detail: ServerToolDetail) -> Self {
        let tools = detail
            .tools
            .into_iter()
            .map(|tool| ToolDescriptor {
                args: tool
                    .input_schema
                    .as_ref()
                    .map(transform_schema)
                    .unwrap_or_default(),
                name: tool.name,
                description: tool.description,
                open: false,
                loading: false,
                text_result: None,
            })
            .collect();
        Self {
            id: detail.id,
            name: detail.name,
            brief: detail.brief,
            content: detail.content,
            overview: detail.overview,
            logo_url: detail.logo_url,
            mcp_type: detail.mcp_type,
            server_url: detail.server_url,
            create_time: detail.create_time,
            tools,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailTab {
    Content,
    Tools,
    Overview,
}

impl DetailTab {
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Overview)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Tools => "tools",
            Self::Overview => "overview",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "content" => Some(Self::Content),
            "tools" => Some(Self::Tools),
            "overview" => Some(Self::Overview),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugTicket {
    pub generation: u64,
    pub tool_index: usize,
}

/// Outcome of merging a response into the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Applied,
    Stale,
}

#[derive(Debug)]
pub struct DetailView {
    selected_id: Option<String>,
    record: Option<ToolServerRecord>,
    tab: DetailTab,
    test_disabled: bool,
    generation: u64,
}

impl Default for DetailView {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailView {
    pub fn new() -> Self {
        Self {
            selected_id: None,
            record: None,
            tab: DetailTab::Content,
            test_disabled: false,
            generation: 0,
        }
    }

    pub fn record(&self) -> Option<&ToolServerRecord> {
        self.record.as_ref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn tab(&self) -> DetailTab {
        self.tab
    }

    pub fn test_disabled(&self) -> bool {
        self.test_disabled
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tool(&self, tool_index: usize) -> Option<&ToolDescriptor> {
        self.record.as_ref()?.tools.get(tool_index)
    }

    fn tool_mut(&mut self, tool_index: usize) -> Option<&mut ToolDescriptor> {
        self.record.as_mut()?.tools.get_mut(tool_index)
    }

    /// Select a new tool server id. The previous record stays visible until
    /// the new one arrives.
    pub fn begin_fetch(&mut self, id: &str) -> FetchTicket {
        self.generation += 1;
        self.selected_id = Some(id.to_string());
        FetchTicket {
            generation: self.generation,
        }
    }

    pub fn apply_fetch(&mut self, ticket: FetchTicket, record: ToolServerRecord) -> Merge {
        if ticket.generation != self.generation {
            return Merge::Stale;
        }
        self.record = Some(record);
        Merge::Applied
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.selected_id = None;
        self.record = None;
    }

    /// Returns false when the tab is disabled; the current tab is kept.
    pub fn select_tab(&mut self, tab: DetailTab) -> bool {
        if !tab.is_enabled() {
            return false;
        }
        self.tab = tab;
        true
    }

    pub fn set_test_disabled(&mut self, disabled: bool) {
        self.test_disabled = disabled;
    }

    pub fn toggle_tool(&mut self, tool_index: usize) {
        if let Some(tool) = self.tool_mut(tool_index) {
            tool.open = !tool.open;
        }
    }

    pub fn set_tool_open(&mut self, tool_index: usize, open: bool) {
        if let Some(tool) = self.tool_mut(tool_index) {
            if tool.open != open {
                tool.open = open;
            }
        }
    }

    /// Out-of-range coordinates leave the view untouched.
    pub fn edit_arg(&mut self, tool_index: usize, arg_index: usize, value: Value) -> bool {
        match self
            .tool_mut(tool_index)
            .and_then(|tool| tool.args.get_mut(arg_index))
        {
            Some(arg) => {
                arg.value = value;
                true
            }
            None => false,
        }
    }

    /// True while the displayed record belongs to an earlier selection.
    pub fn selection_pending(&self) -> bool {
        match (self.selected_id.as_deref(), self.record.as_ref()) {
            (Some(selected), Some(record)) => selected != record.id,
            _ => false,
        }
    }

    pub fn can_run(&self, tool_index: usize) -> bool {
        if self.test_disabled || self.selection_pending() {
            return false;
        }
        match self.tool(tool_index) {
            Some(tool) => !tool.loading && !tool.args.iter().any(ArgDescriptor::is_missing),
            None => false,
        }
    }

    /// Validate and serialize a debug call for a tool and mark it loading.
    /// Nothing is mutated when serialization fails.
    pub fn begin_debug(
        &mut self,
        tool_index: usize,
    ) -> Result<(DebugTicket, DebugToolRequest), ConsoleError> {
        let record = self.record.as_ref().ok_or(ConsoleError::NotLoaded)?;
        let tool = record
            .tools
            .get(tool_index)
            .ok_or(ConsoleError::UnknownTool(tool_index))?;
        if let Some(selected) = self.selected_id.as_deref().filter(|id| *id != record.id) {
            return Err(ConsoleError::SelectionPending(selected.to_string()));
        }
        if tool.loading {
            return Err(ConsoleError::RunInFlight(tool.name.clone()));
        }
        if !self.can_run(tool_index) {
            return Err(ConsoleError::RunDisabled(tool.name.clone()));
        }
        let tool_args = build_tool_args(&tool.args)?;
        let request = DebugToolRequest {
            mcp_server_id: record.id.clone(),
            mcp_server_url: record.server_url.clone().unwrap_or_default(),
            tool_name: tool.name.clone(),
            tool_id: record.id.clone(),
            tool_args,
        };
        let generation = self.generation;
        let tool = self
            .tool_mut(tool_index)
            .ok_or(ConsoleError::UnknownTool(tool_index))?;
        tool.loading = true;
        Ok((
            DebugTicket {
                generation,
                tool_index,
            },
            request,
        ))
    }

    /// Settle a debug run. A successful response replaces the stored result
    /// with the first content item's text; a failure keeps the previous
    /// result. Either way the loading flag is cleared.
    pub fn finish_debug(
        &mut self,
        ticket: DebugTicket,
        outcome: Result<&DebugToolResponse, &ConsoleError>,
    ) -> Merge {
        if ticket.generation != self.generation {
            return Merge::Stale;
        }
        let Some(tool) = self.tool_mut(ticket.tool_index) else {
            return Merge::Stale;
        };
        if !tool.loading {
            return Merge::Stale;
        }
        if let Ok(response) = outcome {
            if let Some(content) = response.content.as_ref() {
                tool.text_result = content.first().and_then(|item| item.text.clone());
            }
        }
        tool.loading = false;
        Merge::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::DebugContent;
    use serde_json::json;

    fn sample_detail() -> ServerToolDetail {
        serde_json::from_value(json!({
            "id": "srv-1",
            "name": "Weather",
            "brief": "Forecasts",
            "serverUrl": "https://mcp.example.com/sse",
            "tools": [
                {
                    "name": "forecast",
                    "description": "Get forecast",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "city": {"type": "string"},
                            "days": {"type": "integer", "default": 3}
                        },
                        "required": ["city"]
                    }
                },
                {"name": "ping"}
            ]
        }))
        .expect("detail")
    }

    fn loaded_view() -> DetailView {
        let mut view = DetailView::new();
        let ticket = view.begin_fetch("srv-1");
        let merged = view.apply_fetch(ticket, ToolServerRecord::from_wire(sample_detail()));
        assert_eq!(merged, Merge::Applied);
        view
    }

    fn text_response(text: &str) -> DebugToolResponse {
        DebugToolResponse {
            content: Some(vec![DebugContent {
                kind: Some("text".into()),
                text: Some(text.into()),
            }]),
            is_error: None,
        }
    }

    #[test]
    fn tools_without_schema_have_no_args() {
        let view = loaded_view();
        assert_eq!(view.tool(0).unwrap().args.len(), 2);
        assert!(view.tool(1).unwrap().args.is_empty());
    }

    #[test]
    fn toggle_twice_restores_open_state() {
        let mut view = loaded_view();
        let before = view.tool(0).unwrap().open;
        view.toggle_tool(0);
        assert_ne!(view.tool(0).unwrap().open, before);
        view.toggle_tool(0);
        assert_eq!(view.tool(0).unwrap().open, before);
        view.toggle_tool(99);
    }

    #[test]
    fn set_tool_open_is_idempotent() {
        let mut view = loaded_view();
        view.set_tool_open(0, true);
        view.set_tool_open(0, true);
        assert!(view.tool(0).unwrap().open);
        view.set_tool_open(0, false);
        assert!(!view.tool(0).unwrap().open);
    }

    #[test]
    fn edit_out_of_range_is_noop() {
        let mut view = loaded_view();
        assert!(!view.edit_arg(0, 9, json!("x")));
        assert!(!view.edit_arg(9, 0, json!("x")));
        assert_eq!(view.tool(0).unwrap().args[0].value, json!(""));
    }

    #[test]
    fn run_guard_follows_required_args_and_test_flag() {
        let mut view = loaded_view();
        assert!(!view.can_run(0));
        assert!(view.can_run(1));
        view.edit_arg(0, 0, json!("  "));
        assert!(!view.can_run(0));
        view.edit_arg(0, 0, json!("Paris"));
        assert!(view.can_run(0));
        view.set_test_disabled(true);
        assert!(!view.can_run(0));
        assert!(!view.can_run(1));
        assert!(!view.can_run(7));
    }

    #[test]
    fn overview_tab_is_refused() {
        let mut view = loaded_view();
        assert!(view.select_tab(DetailTab::Tools));
        assert!(!view.select_tab(DetailTab::Overview));
        assert_eq!(view.tab(), DetailTab::Tools);
    }

    #[test]
    fn stale_fetch_is_discarded() {
        let mut view = DetailView::new();
        let first = view.begin_fetch("old");
        let second = view.begin_fetch("srv-1");
        assert_eq!(
            view.apply_fetch(second, ToolServerRecord::from_wire(sample_detail())),
            Merge::Applied
        );
        let mut old = sample_detail();
        old.name = "Old".into();
        assert_eq!(
            view.apply_fetch(first, ToolServerRecord::from_wire(old)),
            Merge::Stale
        );
        assert_eq!(view.record().unwrap().name, "Weather");
    }

    #[test]
    fn debug_round_trip_sets_result_and_clears_loading() {
        let mut view = loaded_view();
        view.edit_arg(0, 0, json!("Paris"));
        let (ticket, request) = view.begin_debug(0).unwrap();
        assert!(view.tool(0).unwrap().loading);
        assert_eq!(request.tool_name, "forecast");
        assert_eq!(request.mcp_server_url, "https://mcp.example.com/sse");
        assert_eq!(request.tool_id, "srv-1");
        assert_eq!(request.tool_args["city"], json!("Paris"));
        assert_eq!(request.tool_args["days"], json!(3));
        let response = text_response("sunny");
        assert_eq!(view.finish_debug(ticket, Ok(&response)), Merge::Applied);
        let tool = view.tool(0).unwrap();
        assert!(!tool.loading);
        assert_eq!(tool.text_result.as_deref(), Some("sunny"));
    }

    #[test]
    fn failed_debug_keeps_previous_result() {
        let mut view = loaded_view();
        let (ticket, _) = view.begin_debug(1).unwrap();
        view.finish_debug(ticket, Ok(&text_response("pong")));
        let (ticket, _) = view.begin_debug(1).unwrap();
        let err = ConsoleError::Application {
            code: 500,
            message: "boom".into(),
        };
        view.finish_debug(ticket, Err(&err));
        let tool = view.tool(1).unwrap();
        assert!(!tool.loading);
        assert_eq!(tool.text_result.as_deref(), Some("pong"));
    }

    #[test]
    fn second_run_is_refused_while_first_in_flight() {
        let mut view = loaded_view();
        let (first, _) = view.begin_debug(1).unwrap();
        assert!(!view.can_run(1));
        assert!(matches!(
            view.begin_debug(1),
            Err(ConsoleError::RunInFlight(name)) if name == "ping"
        ));
        assert!(view.tool(1).unwrap().loading);
        assert_eq!(
            view.finish_debug(first, Ok(&text_response("first"))),
            Merge::Applied
        );
        assert!(view.can_run(1));
        assert_eq!(
            view.finish_debug(first, Ok(&text_response("again"))),
            Merge::Stale
        );
        assert_eq!(view.tool(1).unwrap().text_result.as_deref(), Some("first"));
    }

    #[test]
    fn run_is_refused_while_new_selection_loads() {
        let mut view = loaded_view();
        let ticket = view.begin_fetch("srv-2");
        assert!(view.selection_pending());
        assert!(!view.can_run(1));
        assert!(matches!(
            view.begin_debug(1),
            Err(ConsoleError::SelectionPending(id)) if id == "srv-2"
        ));
        assert!(!view.tool(1).unwrap().loading);

        let mut detail = sample_detail();
        detail.id = "srv-2".into();
        detail.server_url = Some("https://other.example.com/sse".into());
        view.apply_fetch(ticket, ToolServerRecord::from_wire(detail));
        let (_, request) = view.begin_debug(1).unwrap();
        assert_eq!(request.mcp_server_id, "srv-2");
        assert_eq!(request.tool_id, "srv-2");
        assert_eq!(request.mcp_server_url, "https://other.example.com/sse");
    }

    #[test]
    fn debug_after_clear_is_stale() {
        let mut view = loaded_view();
        let (ticket, _) = view.begin_debug(1).unwrap();
        view.clear();
        assert_eq!(
            view.finish_debug(ticket, Ok(&text_response("late"))),
            Merge::Stale
        );
        assert!(view.record().is_none());
    }

    #[test]
    fn serialization_failure_leaves_tool_idle() {
        let mut detail = sample_detail();
        detail.tools[1].input_schema = serde_json::from_value(json!({
            "properties": {"ids": {"type": "array"}}
        }))
        .ok();
        let mut view = DetailView::new();
        let ticket = view.begin_fetch("srv-1");
        view.apply_fetch(ticket, ToolServerRecord::from_wire(detail));
        view.edit_arg(1, 0, json!("[1,"));
        assert!(matches!(
            view.begin_debug(1),
            Err(ConsoleError::InvalidArgument { .. })
        ));
        assert!(!view.tool(1).unwrap().loading);
    }

    #[test]
    fn empty_content_clears_result_and_missing_content_keeps_it() {
        let mut view = loaded_view();
        let (ticket, _) = view.begin_debug(1).unwrap();
        view.finish_debug(ticket, Ok(&text_response("pong")));
        let (ticket, _) = view.begin_debug(1).unwrap();
        view.finish_debug(ticket, Ok(&DebugToolResponse::default()));
        assert_eq!(view.tool(1).unwrap().text_result.as_deref(), Some("pong"));
        let (ticket, _) = view.begin_debug(1).unwrap();
        let empty = DebugToolResponse {
            content: Some(Vec::new()),
            is_error: None,
        };
        view.finish_debug(ticket, Ok(&empty));
        assert_eq!(view.tool(1).unwrap().text_result, None);
    }
}
