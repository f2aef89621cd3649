use std::future::Future;
use std::sync::Arc;

use crate::app::notify::Notifier;
use crate::infra::http::ConsoleHttp;
use crate::shared::error::ConsoleError;
use crate::shared::types::{
    DebugToolRequest, DebugToolResponse, EnableToolFavoriteParams, GetToolDetailParams,
    ListToolSquareParams, Page, ServerToolDetail, ToolDetail, ToolSummary,
};

pub const LIST_TOOL_SQUARE_PATH: &str = "/tool/list-tool-square";
pub const TOOL_FAVORITE_PATH: &str = "/tool/favorite";
pub const TOOL_DETAIL_PATH: &str = "/tool/detail";
pub const SERVER_TOOL_DETAIL_PATH: &str = "/mcp/server-tool-detail";
pub const DEBUG_SERVER_TOOL_PATH: &str = "/mcp/debug-server-tool";

/// The console REST surface. Implementations pass requests straight
/// through: no retries, no caching.
pub trait ConsoleBackend: Send + Sync + 'static {
    fn list_tool_square(
        &self,
        params: &ListToolSquareParams,
    ) -> impl Future<Output = Result<Page<ToolSummary>, ConsoleError>> + Send;

    fn enable_tool_favorite(
        &self,
        params: &EnableToolFavoriteParams,
    ) -> impl Future<Output = Result<i64, ConsoleError>> + Send;

    /// Reports its own failures to the user. Callers only propagate.
    fn get_tool_detail(
        &self,
        params: &GetToolDetailParams,
    ) -> impl Future<Output = Result<ToolDetail, ConsoleError>> + Send;

    fn get_server_tool_detail(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<ServerToolDetail, ConsoleError>> + Send;

    fn debug_server_tool(
        &self,
        request: &DebugToolRequest,
    ) -> impl Future<Output = Result<DebugToolResponse, ConsoleError>> + Send;
}

pub struct ConsoleApi {
    http: ConsoleHttp,
    notifier: Arc<dyn Notifier>,
}

impl ConsoleApi {
    pub fn new(http: ConsoleHttp, notifier: Arc<dyn Notifier>) -> Self {
        Self { http, notifier }
    }
}

impl ConsoleBackend for ConsoleApi {
    async fn list_tool_square(
        &self,
        params: &ListToolSquareParams,
    ) -> Result<Page<ToolSummary>, ConsoleError> {
        self.http.post(LIST_TOOL_SQUARE_PATH, params).await
    }

    async fn enable_tool_favorite(
        &self,
        params: &EnableToolFavoriteParams,
    ) -> Result<i64, ConsoleError> {
        self.http.get(TOOL_FAVORITE_PATH, params).await
    }

    async fn get_tool_detail(&self, params: &GetToolDetailParams) -> Result<ToolDetail, ConsoleError> {
        let result = self.http.get(TOOL_DETAIL_PATH, params).await;
        if let Err(err) = &result {
            self.notifier.error(&err.to_string());
        }
        result
    }

    async fn get_server_tool_detail(&self, id: &str) -> Result<ServerToolDetail, ConsoleError> {
        self.http.get(SERVER_TOOL_DETAIL_PATH, &[("id", id)]).await
    }

    async fn debug_server_tool(
        &self,
        request: &DebugToolRequest,
    ) -> Result<DebugToolResponse, ConsoleError> {
        self.http.post(DEBUG_SERVER_TOOL_PATH, request).await
    }
}
