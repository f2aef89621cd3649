//! In-memory stand-in for the console backend. Serves the tool square, the
//! favorite toggle, tool detail and the MCP server detail / debug endpoints,
//! all wrapped in the `{code, message, data}` envelope.

use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    sync::Arc,
};

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;

pub const NOT_FOUND_CODE: i64 = 3;
pub const TOOL_FAILURE_CODE: i64 = 500;

#[derive(Default)]
pub struct MockState {
    favorites: Mutex<HashSet<String>>,
    debug_calls: Mutex<Vec<Value>>,
}

impl MockState {
    /// Bodies received on the debug endpoint, oldest first.
    pub fn debug_calls(&self) -> Vec<Value> {
        self.debug_calls.lock().clone()
    }

    pub fn is_favorite(&self, tool_id: &str) -> bool {
        self.favorites.lock().contains(tool_id)
    }
}

pub fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/tool/list-tool-square", post(list_tool_square))
        .route("/tool/favorite", get(favorite))
        .route("/tool/detail", get(tool_detail))
        .route("/mcp/server-tool-detail", get(server_tool_detail))
        .route("/mcp/debug-server-tool", post(debug_server_tool))
        .with_state(state)
}

pub struct MockHandle {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl MockHandle {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.task.await;
    }
}

/// Bind `addr` (use port 0 for an ephemeral port) and serve until the
/// handle is shut down.
pub async fn spawn(addr: SocketAddr) -> Result<MockHandle> {
    let listener = TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;
    let state = Arc::new(MockState::default());
    let app = router(state.clone());
    let shutdown = CancellationToken::new();
    let task = tokio::spawn({
        let ct = shutdown.clone();
        async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move { ct.cancelled().await })
                .await;
        }
    });
    tracing::info!(%addr, "mock console server listening");
    Ok(MockHandle {
        addr,
        state,
        shutdown,
        task,
    })
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({"code": 0, "message": "success", "data": data}))
}

fn fail(code: i64, message: &str) -> Json<Value> {
    Json(json!({"code": code, "message": message, "data": null}))
}

fn square() -> Vec<Value> {
    vec![
        json!({
            "id": "t-weather",
            "name": "Weather",
            "description": "Forecasts by city",
            "favoriteCount": 12,
            "isMcp": false
        }),
        json!({
            "id": "t-calc",
            "name": "Calculator",
            "description": "Arithmetic over MCP",
            "favoriteCount": 4,
            "isMcp": true,
            "mcpToolId": "calc"
        }),
        json!({
            "id": "t-translate",
            "name": "Translator",
            "description": "Text translation",
            "favoriteCount": 0,
            "isMcp": false
        }),
    ]
}

async fn list_tool_square(
    State(state): State<Arc<MockState>>,
    Json(params): Json<Value>,
) -> Json<Value> {
    let page = params.get("page").and_then(Value::as_u64).unwrap_or(1).max(1);
    let page_size = params
        .get("pageSize")
        .and_then(Value::as_u64)
        .unwrap_or(20)
        .max(1);
    let needle = params
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_lowercase);

    let favorites = state.favorites.lock().clone();
    let matching: Vec<Value> = square()
        .into_iter()
        .filter(|tool| match &needle {
            Some(needle) => tool["name"]
                .as_str()
                .is_some_and(|name| name.to_lowercase().contains(needle)),
            None => true,
        })
        .map(|mut tool| {
            let id = tool["id"].as_str().unwrap_or_default().to_string();
            tool["isFavorite"] = json!(favorites.contains(&id));
            tool
        })
        .collect();

    let total = matching.len() as u64;
    let page_data: Vec<Value> = matching
        .into_iter()
        .skip(((page - 1) * page_size) as usize)
        .take(page_size as usize)
        .collect();
    ok(json!({
        "pageData": page_data,
        "totalCount": total,
        "page": page,
        "pageSize": page_size,
        "totalPages": total.div_ceil(page_size),
    }))
}

async fn favorite(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let Some(tool_id) = query.get("toolId") else {
        return fail(400, "toolId is required");
    };
    if !square().iter().any(|tool| tool["id"] == tool_id.as_str()) {
        return fail(NOT_FOUND_CODE, "tool not found");
    }
    let mut favorites = state.favorites.lock();
    match query.get("favoriteFlag").map(String::as_str) {
        Some("1") => {
            favorites.remove(tool_id);
        }
        _ => {
            favorites.insert(tool_id.clone());
        }
    }
    ok(json!(1))
}

async fn tool_detail(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let id = query.get("id").map(String::as_str).unwrap_or_default();
    let Some(mut tool) = square().into_iter().find(|tool| tool["id"] == id) else {
        return fail(NOT_FOUND_CODE, "tool not found");
    };
    tool["isFavorite"] = json!(state.is_favorite(id));
    tool["address"] = json!(format!("https://tools.example.com/{id}"));
    tool["usageCount"] = json!(42);
    tool["createTime"] = json!("2025-03-01 08:15:00");
    if let Some(tag) = query.get("tag") {
        tool["tag"] = json!(tag);
    }
    ok(tool)
}

fn calc_server() -> Value {
    json!({
        "id": "calc",
        "name": "Calculator",
        "brief": "Arithmetic over MCP",
        "overview": "Overview text",
        "content": "Calculator tools for exercising the debug panel.",
        "logoUrl": "https://tools.example.com/calc.png",
        "mcpType": "sse",
        "serverUrl": "http://calc.internal/sse",
        "createTime": 1_700_000_000_000i64,
        "tools": [
            {
                "name": "echo",
                "description": "Echo back the supplied text.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "text": {"type": "string", "description": "Text to echo"},
                        "repeat": {"type": "integer", "default": 1}
                    },
                    "required": ["text"]
                }
            },
            {
                "name": "add",
                "description": "Sum a list of numbers.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "numbers": {"type": "array", "description": "Numbers to add"}
                    }
                }
            },
            {
                "name": "fail",
                "description": "Always fails.",
                "inputSchema": {"type": "object", "properties": {}}
            }
        ]
    })
}

async fn server_tool_detail(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    match query.get("id").map(String::as_str) {
        Some("calc") => ok(calc_server()),
        _ => fail(NOT_FOUND_CODE, "server not found"),
    }
}

async fn debug_server_tool(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.debug_calls.lock().push(body.clone());
    let args = &body["toolArgs"];
    let text = match body["toolName"].as_str() {
        Some("echo") => {
            let text = args["text"].as_str().unwrap_or_default();
            let repeat = args["repeat"].as_u64().unwrap_or(1).max(1) as usize;
            vec![text; repeat].join(" ")
        }
        Some("add") => {
            let numbers = args["numbers"].as_array().cloned().unwrap_or_default();
            if numbers.iter().all(Value::is_i64) {
                numbers.iter().filter_map(Value::as_i64).sum::<i64>().to_string()
            } else {
                numbers.iter().filter_map(Value::as_f64).sum::<f64>().to_string()
            }
        }
        Some("fail") => return fail(TOOL_FAILURE_CODE, "tool exploded"),
        Some(other) => return fail(NOT_FOUND_CODE, &format!("unknown tool: {other}")),
        None => return fail(400, "toolName is required"),
    };
    tracing::debug!(tool = %body["toolName"], "mock debug call");
    ok(json!({
        "content": [{"type": "text", "text": text}],
        "isError": false
    }))
}
