//! Tool definitions.
//!
//! A [`Tool`] pairs a wire descriptor (name, description, input schema) with
//! a typed async handler. Handlers receive the per-request
//! [`RequestContext`] and their deserialized input; the input schema is
//! generated from the input type via `schemars`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::{Error, JsonRpcError, Result};
use crate::protocol::{CallToolResult, ToolDescriptor};

type HandlerFuture = Pin<Box<dyn Future<Output = Result<CallToolResult>> + Send>>;
type Handler = Arc<dyn Fn(RequestContext, Value) -> HandlerFuture + Send + Sync>;

/// Input type for tools that take no arguments.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoParams {}

/// A registered tool.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    input_schema: Value,
    handler: Handler,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool").field("name", &self.name).finish()
    }
}

impl Tool {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }

    /// Execute the tool with raw arguments from a `tools/call` request.
    pub async fn call(&self, ctx: RequestContext, arguments: Value) -> Result<CallToolResult> {
        (self.handler)(ctx, arguments).await
    }
}

/// Builder for [`Tool`].
pub struct ToolBuilder {
    name: String,
    description: String,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach the typed handler and finish the tool.
    ///
    /// The input schema is derived from `I`. Argument parse failures surface
    /// as JSON-RPC invalid-params errors before the handler runs.
    pub fn handler<I, F, Fut>(self, f: F) -> Tool
    where
        I: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(RequestContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CallToolResult>> + Send + 'static,
    {
        let schema = serde_json::to_value(schemars::schema_for!(I))
            .unwrap_or_else(|_| Value::Object(Default::default()));
        let name = self.name.clone();
        let handler: Handler = Arc::new(move |ctx, arguments| {
            // Tools without arguments may be called with null params.
            let arguments = if arguments.is_null() {
                Value::Object(Default::default())
            } else {
                arguments
            };
            match serde_json::from_value::<I>(arguments) {
                Ok(input) => Box::pin(f(ctx, input)),
                Err(e) => {
                    let err = Error::JsonRpc(JsonRpcError::invalid_params(format!(
                        "Invalid arguments for tool '{}': {}",
                        name, e
                    )));
                    Box::pin(async move { Err(err) })
                }
            }
        });

        Tool {
            name: self.name,
            description: self.description,
            input_schema: schema,
            handler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::resolver::ClientResolver;
    use crate::config::DepotConfig;
    use crate::context::RequestAuth;
    use crate::protocol::RequestId;

    fn test_context() -> RequestContext {
        RequestContext::new(
            RequestId::Number(1),
            RequestAuth::none(),
            ClientResolver::new(None, reqwest::Client::new(), DepotConfig::default()),
        )
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    struct EchoInput {
        message: String,
    }

    fn echo_tool() -> Tool {
        ToolBuilder::new("echo")
            .description("Echo a message back")
            .handler(|_ctx: RequestContext, input: EchoInput| async move {
                Ok(CallToolResult::text(input.message))
            })
    }

    #[tokio::test]
    async fn test_typed_handler_receives_input() {
        let tool = echo_tool();
        let result = tool
            .call(test_context(), serde_json::json!({"message": "hi"}))
            .await
            .unwrap();
        match &result.content[0] {
            crate::protocol::Content::Text { text } => assert_eq!(text, "hi"),
        }
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_invalid_params() {
        let tool = echo_tool();
        let err = tool
            .call(test_context(), serde_json::json!({"wrong": 1}))
            .await
            .unwrap_err();
        match err {
            Error::JsonRpc(rpc) => {
                assert_eq!(rpc.code, crate::error::ErrorCode::InvalidParams.code());
                assert!(rpc.message.contains("echo"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_null_arguments_accepted_for_no_params() {
        let tool = ToolBuilder::new("noop")
            .description("No input")
            .handler(|_ctx: RequestContext, _input: NoParams| async move {
                Ok(CallToolResult::text("ok"))
            });
        let result = tool.call(test_context(), Value::Null).await.unwrap();
        assert!(result.is_error.is_none());
        assert_eq!(result.content.len(), 1);
    }

    #[test]
    fn test_descriptor_carries_schema() {
        let descriptor = echo_tool().descriptor();
        assert_eq!(descriptor.name, "echo");
        assert_eq!(descriptor.description, "Echo a message back");
        let schema = descriptor.input_schema;
        assert!(schema["properties"]["message"].is_object());
    }
}
