use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::error::ConsoleError;

/// Response envelope wrapped around every console backend payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            message: "success".into(),
            data: Some(data),
        }
    }

    /// Unwrap the payload; any non-zero code becomes an application error
    /// carrying the server message.
    pub fn into_result(self) -> Result<T, ConsoleError> {
        if self.code != 0 {
            return Err(ConsoleError::Application {
                code: self.code,
                message: self.message,
            });
        }
        self.data.ok_or(ConsoleError::MissingData)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub page_data: Vec<T>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            page_data: Vec::new(),
            total_count: 0,
            page: 1,
            page_size: 0,
            total_pages: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolSquareParams {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_flag: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<i64>,
}

impl Default for ListToolSquareParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            content: None,
            order_flag: None,
            tags: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableToolFavoriteParams {
    pub tool_id: String,
    /// 0 adds the favorite, 1 removes it.
    pub favorite_flag: i32,
    #[serde(default)]
    pub is_mcp: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetToolDetailParams {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub favorite_count: u64,
    #[serde(default)]
    pub is_mcp: bool,
    #[serde(default)]
    pub mcp_tool_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub create_time: Option<CreateTime>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Creation timestamps arrive either as epoch milliseconds or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreateTime {
    Millis(i64),
    Text(String),
}

/// Raw tool server detail as returned by the backend, before the input
/// schemas are turned into argument forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerToolDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brief: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub mcp_type: Option<String>,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub create_time: Option<CreateTime>,
    #[serde(default)]
    pub tools: Vec<ServerTool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Option<InputSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct InputSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, SchemaProperty>,
    #[serde(default)]
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SchemaProperty {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DebugToolRequest {
    pub mcp_server_id: String,
    pub mcp_server_url: String,
    pub tool_name: String,
    pub tool_id: String,
    pub tool_args: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DebugToolResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<DebugContent>>,
    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DebugContent {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_with_nonzero_code_becomes_application_error() {
        let envelope: ApiEnvelope<ToolDetail> =
            serde_json::from_value(json!({"code": 3, "message": "tool not found", "data": null}))
                .unwrap();
        match envelope.into_result() {
            Err(ConsoleError::Application { code, message }) => {
                assert_eq!(code, 3);
                assert_eq!(message, "tool not found");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn envelope_without_data_is_missing_data() {
        let envelope: ApiEnvelope<i64> =
            serde_json::from_value(json!({"code": 0, "message": "ok"})).unwrap();
        assert!(matches!(envelope.into_result(), Err(ConsoleError::MissingData)));
    }

    #[test]
    fn input_schema_keeps_property_order() {
        let schema: InputSchema = serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "zeta": {"type": "string"},
                "alpha": {"type": "number"},
                "mid": {"type": "boolean"}
            }
        }))
        .unwrap();
        let names: Vec<&str> = schema.properties.keys().map(String::as_str).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert!(schema.required.is_empty());
    }

    #[test]
    fn create_time_accepts_millis_and_text() {
        let millis: CreateTime = serde_json::from_value(json!(1_700_000_000_000i64)).unwrap();
        assert_eq!(millis, CreateTime::Millis(1_700_000_000_000));
        let text: CreateTime = serde_json::from_value(json!("2025-03-01 08:00:00")).unwrap();
        assert_eq!(text, CreateTime::Text("2025-03-01 08:00:00".into()));
    }
}
