//! JSON-RPC 2.0 framing and the MCP surface this server speaks.
//!
//! The server implements the subset of the Model Context Protocol a tool-only
//! server needs: `initialize`, `ping`, `tools/list`, `tools/call`, and the
//! `notifications/initialized` notification, over single or batch messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::JsonRpcError;

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version this server reports.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// JSON-RPC request ID - can be string or number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<i32> for RequestId {
    fn from(n: i32) -> Self {
        RequestId::Number(n as i64)
    }
}

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Validate that this request conforms to JSON-RPC 2.0.
    pub fn validate(&self) -> Result<(), JsonRpcError> {
        if self.jsonrpc != JSONRPC_VERSION {
            return Err(JsonRpcError::invalid_request(format!(
                "Invalid JSON-RPC version: expected '{}', got '{}'",
                JSONRPC_VERSION, self.jsonrpc
            )));
        }
        Ok(())
    }
}

/// JSON-RPC 2.0 notification (no response expected)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response (success)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResultResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    pub result: Value,
}

/// JSON-RPC 2.0 response (error)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub error: JsonRpcError,
}

/// JSON-RPC 2.0 response (either success or error)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResponse {
    Result(JsonRpcResultResponse),
    Error(JsonRpcErrorResponse),
}

impl JsonRpcResponse {
    pub fn result(id: RequestId, result: Value) -> Self {
        Self::Result(JsonRpcResultResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result,
        })
    }

    pub fn error(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self::Error(JsonRpcErrorResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error,
        })
    }
}

/// JSON-RPC 2.0 message - a single request or a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Single(JsonRpcRequest),
    Batch(Vec<JsonRpcRequest>),
}

/// Response counterpart of [`JsonRpcMessage`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResponseMessage {
    Single(JsonRpcResponse),
    Batch(Vec<JsonRpcResponse>),
}

// =============================================================================
// MCP requests
// =============================================================================

/// Parsed MCP request
#[derive(Debug, Clone)]
pub enum McpRequest {
    Initialize(InitializeParams),
    Ping,
    ListTools,
    CallTool(CallToolParams),
    Unknown { method: String },
}

impl McpRequest {
    /// Parse an MCP request out of a JSON-RPC request.
    pub fn from_jsonrpc(req: &JsonRpcRequest) -> Result<Self, JsonRpcError> {
        let params = req.params.clone().unwrap_or(Value::Null);
        match req.method.as_str() {
            "initialize" => {
                let params: InitializeParams = serde_json::from_value(params)
                    .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;
                Ok(McpRequest::Initialize(params))
            }
            "ping" => Ok(McpRequest::Ping),
            "tools/list" => Ok(McpRequest::ListTools),
            "tools/call" => {
                let params: CallToolParams = serde_json::from_value(params)
                    .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;
                Ok(McpRequest::CallTool(params))
            }
            other => Ok(McpRequest::Unknown {
                method: other.to_string(),
            }),
        }
    }

    pub fn method_name(&self) -> &str {
        match self {
            McpRequest::Initialize(_) => "initialize",
            McpRequest::Ping => "ping",
            McpRequest::ListTools => "tools/list",
            McpRequest::CallTool(_) => "tools/call",
            McpRequest::Unknown { method } => method,
        }
    }

    /// The operation target, for logging: the tool name of a `tools/call`.
    pub fn target(&self) -> Option<&str> {
        match self {
            McpRequest::CallTool(params) => Some(&params.name),
            _ => None,
        }
    }
}

/// `initialize` parameters. Client capabilities are accepted leniently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(default)]
    pub client_info: Option<Implementation>,
}

/// `tools/call` parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

// =============================================================================
// MCP results
// =============================================================================

/// Server or client implementation info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// `initialize` result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: Implementation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Wire descriptor of a registered tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// `tools/list` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<ToolDescriptor>,
}

/// A piece of content in a tool result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

/// `tools/call` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<Content>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    /// A successful result carrying one text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
            is_error: None,
        }
    }

    /// Render a JSON value as pretty-printed text content.
    pub fn json(value: &Value) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self::text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id_untagged() {
        let n: RequestId = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(n, RequestId::Number(7));
        let s: RequestId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(s, RequestId::String("abc".to_string()));
    }

    #[test]
    fn test_validate_rejects_wrong_version() {
        let mut req = JsonRpcRequest::new(1, "ping");
        req.jsonrpc = "1.0".to_string();
        assert!(req.validate().is_err());
        assert!(JsonRpcRequest::new(1, "ping").validate().is_ok());
    }

    #[test]
    fn test_parse_tools_call() {
        let req = JsonRpcRequest::new(1, "tools/call").with_params(json!({
            "name": "depot_search",
            "arguments": { "query": "report" }
        }));
        let parsed = McpRequest::from_jsonrpc(&req).unwrap();
        match &parsed {
            McpRequest::CallTool(params) => {
                assert_eq!(params.name, "depot_search");
                assert_eq!(params.arguments["query"], "report");
            }
            other => panic!("unexpected request: {:?}", other),
        }
        assert_eq!(parsed.method_name(), "tools/call");
        assert_eq!(parsed.target(), Some("depot_search"));
    }

    #[test]
    fn test_parse_tools_call_missing_name_is_invalid_params() {
        let req = JsonRpcRequest::new(1, "tools/call").with_params(json!({"arguments": {}}));
        let err = McpRequest::from_jsonrpc(&req).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidParams.code());
    }

    #[test]
    fn test_unknown_method() {
        let req = JsonRpcRequest::new(1, "resources/list");
        let parsed = McpRequest::from_jsonrpc(&req).unwrap();
        assert!(matches!(parsed, McpRequest::Unknown { .. }));
        assert_eq!(parsed.target(), None);
    }

    #[test]
    fn test_message_untagged_roundtrip() {
        let single: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})).unwrap();
        assert!(matches!(single, JsonRpcMessage::Single(_)));

        let batch: JsonRpcMessage = serde_json::from_value(json!([
            {"jsonrpc": "2.0", "id": 1, "method": "ping"},
            {"jsonrpc": "2.0", "id": 2, "method": "tools/list"}
        ]))
        .unwrap();
        match batch {
            JsonRpcMessage::Batch(requests) => assert_eq!(requests.len(), 2),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_call_tool_result_serialization() {
        let result = CallToolResult::text("hello");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "hello");
        assert!(json.get("isError").is_none());
    }

    #[test]
    fn test_initialize_result_shape() {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
            },
            server_info: Implementation {
                name: "depot-mcp".to_string(),
                version: "0.1.0".to_string(),
            },
            instructions: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(json["serverInfo"]["name"], "depot-mcp");
        assert_eq!(json["capabilities"]["tools"]["listChanged"], false);
    }
}
