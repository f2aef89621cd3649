//! Drives the detail panel: fetches a tool server, lets the user edit tool
//! arguments and runs debug invocations against the backend.
//!
//! The controller is the only place that reports fetch and debug failures
//! to the user. The view lock is never held across an await.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::app::backend::ConsoleBackend;
use crate::app::notify::Notifier;
use crate::domain::detail::{DetailTab, DetailView, Merge, ToolServerRecord};
use crate::infra::metrics::{self, PendingGaugeGuard};
use crate::shared::error::ConsoleError;

pub struct DetailController<B: ConsoleBackend> {
    backend: Arc<B>,
    view: Arc<Mutex<DetailView>>,
    notifier: Arc<dyn Notifier>,
}

impl<B: ConsoleBackend> Clone for DetailController<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            view: self.view.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

impl<B: ConsoleBackend> DetailController<B> {
    pub fn new(backend: Arc<B>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            view: Arc::new(Mutex::new(DetailView::new())),
            notifier,
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Read the current view without holding the lock past `f`.
    pub fn with_view<R>(&self, f: impl FnOnce(&DetailView) -> R) -> R {
        let view = self.view.lock();
        f(&*view)
    }

    /// Fetch a tool server and display it. A response that arrives after a
    /// newer `load` or `clear` is dropped and reported as `Merge::Stale`.
    pub async fn load(&self, id: &str) -> Result<Merge, ConsoleError> {
        let ticket = self.view.lock().begin_fetch(id);
        info!(id, generation = ticket.generation, "loading tool server detail");

        match self.backend.get_server_tool_detail(id).await {
            Ok(detail) => {
                let record = ToolServerRecord::from_wire(detail);
                let tools = record.tools.len();
                let merge = self.view.lock().apply_fetch(ticket, record);
                match merge {
                    Merge::Applied => info!(id, tools, "tool server detail loaded"),
                    Merge::Stale => {
                        metrics::record_stale_response();
                        debug!(id, generation = ticket.generation, "stale detail dropped");
                    }
                }
                Ok(merge)
            }
            Err(err) => {
                let current = self.view.lock().generation() == ticket.generation;
                if current {
                    self.report(&err);
                } else {
                    metrics::record_stale_response();
                    debug!(id, %err, "stale detail failure dropped");
                }
                Err(err)
            }
        }
    }

    pub fn clear(&self) {
        self.view.lock().clear();
    }

    pub fn select_tab(&self, tab: DetailTab) -> bool {
        self.view.lock().select_tab(tab)
    }

    pub fn set_test_disabled(&self, disabled: bool) {
        self.view.lock().set_test_disabled(disabled);
    }

    pub fn toggle_tool(&self, tool_index: usize) {
        self.view.lock().toggle_tool(tool_index);
    }

    pub fn set_tool_open(&self, tool_index: usize, open: bool) {
        self.view.lock().set_tool_open(tool_index, open);
    }

    pub fn edit_arg(&self, tool_index: usize, arg_index: usize, value: Value) -> bool {
        self.view.lock().edit_arg(tool_index, arg_index, value)
    }

    /// Parse user-typed text for one argument and store it. Returns
    /// `Ok(false)` for out-of-range coordinates.
    pub fn set_arg_text(
        &self,
        tool_index: usize,
        arg_index: usize,
        raw: &str,
    ) -> Result<bool, ConsoleError> {
        let mut view = self.view.lock();
        let parsed = match view
            .tool(tool_index)
            .and_then(|tool| tool.args.get(arg_index))
        {
            Some(arg) => arg.parse_input(raw),
            None => return Ok(false),
        };
        match parsed {
            Ok(value) => Ok(view.edit_arg(tool_index, arg_index, value)),
            Err(err) => {
                drop(view);
                self.report(&err);
                Err(err)
            }
        }
    }

    pub fn can_run(&self, tool_index: usize) -> bool {
        self.view.lock().can_run(tool_index)
    }

    /// Run one tool with its current arguments. Serialization, transport and
    /// application failures are all reported once and returned.
    pub async fn run_debug(&self, tool_index: usize) -> Result<Merge, ConsoleError> {
        let begun = self.view.lock().begin_debug(tool_index);
        let (ticket, request) = match begun {
            Ok(started) => started,
            Err(err) => {
                self.report(&err);
                return Err(err);
            }
        };

        let run_id = uuid::Uuid::new_v4();
        info!(
            %run_id,
            tool = %request.tool_name,
            args = request.tool_args.len(),
            "debug run started"
        );

        let outcome = {
            let _pending = PendingGaugeGuard::new();
            self.backend.debug_server_tool(&request).await
        };

        let merge = self.view.lock().finish_debug(ticket, outcome.as_ref());
        let state = if outcome.is_ok() { "captured" } else { "failed" };
        info!(%run_id, state, ?merge, "debug run settled");

        if merge == Merge::Stale {
            metrics::record_stale_response();
        }
        match outcome {
            Ok(_) => Ok(merge),
            Err(err) => {
                if merge == Merge::Applied {
                    self.report(&err);
                }
                Err(err)
            }
        }
    }

    fn report(&self, err: &ConsoleError) {
        warn!(kind = err.kind(), %err, "console operation failed");
        self.notifier.error(&err.to_string());
    }
}
