//! MCP request router.
//!
//! [`McpRouter`] owns the tool registry and dispatches parsed MCP requests.
//! It is a tower `Service` over [`RouterRequest`] whose error type is the
//! crate [`Error`]: protocol outcomes (unknown method, invalid params on the
//! request envelope) are normal responses, while collaborator failures from
//! tool execution propagate as typed errors through the middleware chain:
//! the error reporter observes them there, and the JSON-RPC framing layer
//! maps them onto the wire.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde_json::Value;
use tower_service::Service;

use crate::auth::resolver::ClientResolver;
use crate::context::{RequestAuth, RequestContext};
use crate::error::{Error, JsonRpcError};
use crate::protocol::{
    Implementation, InitializeResult, JsonRpcResponse, ListToolsResult, McpRequest, RequestId,
    ServerCapabilities, ToolsCapability, PROTOCOL_VERSION,
};
use crate::tool::Tool;

/// A dispatch request: one parsed MCP request plus the credential slot of the
/// inbound transport request it arrived on.
#[derive(Debug)]
pub struct RouterRequest {
    pub id: RequestId,
    pub inner: McpRequest,
    pub auth: RequestAuth,
}

/// Dispatch response. `inner` carries protocol-level outcomes; collaborator
/// failures never reach it (they travel the service's error channel).
#[derive(Debug)]
pub struct RouterResponse {
    pub id: RequestId,
    pub inner: Result<Value, JsonRpcError>,
}

impl RouterResponse {
    /// Convert to a JSON-RPC response.
    pub fn into_jsonrpc(self) -> JsonRpcResponse {
        match self.inner {
            Ok(result) => JsonRpcResponse::result(self.id, result),
            Err(error) => JsonRpcResponse::error(Some(self.id), error),
        }
    }
}

struct RouterInner {
    server_name: String,
    server_version: String,
    instructions: Option<String>,
    tools: BTreeMap<String, Tool>,
    resolver: ClientResolver,
}

/// Routes MCP requests to registered tools.
#[derive(Clone)]
pub struct McpRouter {
    inner: Arc<RouterInner>,
}

impl std::fmt::Debug for McpRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpRouter")
            .field("server_name", &self.inner.server_name)
            .field("tools_count", &self.inner.tools.len())
            .finish()
    }
}

/// Builder for [`McpRouter`].
pub struct McpRouterBuilder {
    server_name: String,
    server_version: String,
    instructions: Option<String>,
    tools: BTreeMap<String, Tool>,
    resolver: ClientResolver,
}

impl McpRouterBuilder {
    pub fn server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.server_name = name.into();
        self.server_version = version.into();
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Register a tool. A tool with the same name replaces the previous one.
    pub fn tool(mut self, tool: Tool) -> Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    /// Register a batch of tools.
    pub fn tools(mut self, tools: impl IntoIterator<Item = Tool>) -> Self {
        for tool in tools {
            self.tools.insert(tool.name().to_string(), tool);
        }
        self
    }

    pub fn build(self) -> McpRouter {
        McpRouter {
            inner: Arc::new(RouterInner {
                server_name: self.server_name,
                server_version: self.server_version,
                instructions: self.instructions,
                tools: self.tools,
                resolver: self.resolver,
            }),
        }
    }
}

impl McpRouter {
    /// Start building a router around the given client resolver.
    pub fn builder(resolver: ClientResolver) -> McpRouterBuilder {
        McpRouterBuilder {
            server_name: env!("CARGO_PKG_NAME").to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: None,
            tools: BTreeMap::new(),
            resolver,
        }
    }

    pub fn server_name(&self) -> &str {
        &self.inner.server_name
    }

    pub fn tool_count(&self) -> usize {
        self.inner.tools.len()
    }

    /// Dispatch one request.
    pub async fn handle(
        &self,
        id: RequestId,
        request: McpRequest,
        auth: RequestAuth,
    ) -> Result<RouterResponse, Error> {
        let inner = match request {
            McpRequest::Initialize(params) => {
                tracing::debug!(
                    client_version = %params.protocol_version,
                    "initialize request"
                );
                let result = InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    capabilities: ServerCapabilities {
                        tools: Some(ToolsCapability {
                            list_changed: Some(false),
                        }),
                    },
                    server_info: Implementation {
                        name: self.inner.server_name.clone(),
                        version: self.inner.server_version.clone(),
                    },
                    instructions: self.inner.instructions.clone(),
                };
                Ok(serde_json::to_value(result)?)
            }
            McpRequest::Ping => Ok(Value::Object(Default::default())),
            McpRequest::ListTools => {
                let result = ListToolsResult {
                    tools: self
                        .inner
                        .tools
                        .values()
                        .map(|tool| tool.descriptor())
                        .collect(),
                };
                Ok(serde_json::to_value(result)?)
            }
            McpRequest::CallTool(params) => match self.inner.tools.get(&params.name) {
                Some(tool) => {
                    let ctx =
                        RequestContext::new(id.clone(), auth, self.inner.resolver.clone());
                    let result = tool.call(ctx, params.arguments).await?;
                    Ok(serde_json::to_value(result)?)
                }
                None => Err(JsonRpcError::invalid_params(format!(
                    "Unknown tool: {}",
                    params.name
                ))),
            },
            McpRequest::Unknown { method } => Err(JsonRpcError::method_not_found(&method)),
        };

        Ok(RouterResponse { id, inner })
    }

    /// Handle a client notification. The only one this server reacts to is
    /// `notifications/initialized`, and only for logging.
    pub fn handle_notification(&self, method: &str) {
        match method {
            "notifications/initialized" => {
                tracing::debug!("client initialized");
            }
            other => {
                tracing::debug!(method = %other, "ignoring notification");
            }
        }
    }
}

impl Service<RouterRequest> for McpRouter {
    type Response = RouterResponse;
    type Error = Error;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RouterRequest) -> Self::Future {
        let router = self.clone();
        Box::pin(async move { router.handle(req.id, req.inner, req.auth).await })
    }
}
