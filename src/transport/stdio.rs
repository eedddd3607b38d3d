//! Stdio transport.
//!
//! Reads line-delimited JSON-RPC messages from stdin and writes responses to
//! stdout. No auth gate runs here: stdio deployments trust the spawning
//! environment. The request auth slot therefore stays empty; in delegated
//! mode every resolution fails per-request, which `main` warns about at
//! startup.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tower::ServiceBuilder;

use crate::context::RequestAuth;
use crate::error::{Error, JsonRpcError, Result};
use crate::jsonrpc::JsonRpcService;
use crate::protocol::{
    JsonRpcMessage, JsonRpcNotification, JsonRpcResponse, JsonRpcResponseMessage,
};
use crate::report::{ErrorReportLayer, ErrorReportService};
use crate::router::McpRouter;

/// Stdio transport for the MCP server.
pub struct StdioTransport {
    service: JsonRpcService<ErrorReportService<McpRouter>>,
    router: McpRouter,
}

impl StdioTransport {
    pub fn new(router: McpRouter) -> Self {
        let dispatch = ServiceBuilder::new()
            .layer(ErrorReportLayer::new())
            .service(router.clone());
        Self {
            service: JsonRpcService::new(dispatch),
            router,
        }
    }

    /// Run the transport, processing messages until EOF.
    pub async fn run(&mut self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        tracing::info!("stdio transport started, waiting for input");

        loop {
            line.clear();
            let bytes_read = reader
                .read_line(&mut line)
                .await
                .map_err(|e| Error::Transport(format!("failed to read from stdin: {}", e)))?;

            if bytes_read == 0 {
                tracing::info!("stdin closed, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(response) = self.process_line(trimmed).await {
                let response_json = serde_json::to_string(&response)?;
                stdout
                    .write_all(response_json.as_bytes())
                    .await
                    .map_err(|e| Error::Transport(format!("failed to write to stdout: {}", e)))?;
                stdout
                    .write_all(b"\n")
                    .await
                    .map_err(|e| Error::Transport(format!("failed to write newline: {}", e)))?;
                stdout
                    .flush()
                    .await
                    .map_err(|e| Error::Transport(format!("failed to flush stdout: {}", e)))?;
            }
        }

        Ok(())
    }

    /// Process one line of input. Returns `None` for notifications.
    async fn process_line(&self, line: &str) -> Option<JsonRpcResponseMessage> {
        let parsed: serde_json::Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                return Some(JsonRpcResponseMessage::Single(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
                )));
            }
        };

        if parsed.is_object() && parsed.get("id").is_none() {
            if let Ok(notification) = serde_json::from_value::<JsonRpcNotification>(parsed) {
                self.router.handle_notification(&notification.method);
            }
            return None;
        }

        let message: JsonRpcMessage = match serde_json::from_value(parsed) {
            Ok(m) => m,
            Err(e) => {
                return Some(JsonRpcResponseMessage::Single(JsonRpcResponse::error(
                    None,
                    JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
                )));
            }
        };

        Some(self.service.call_message(message, RequestAuth::none()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::resolver::ClientResolver;
    use crate::config::DepotConfig;

    fn transport() -> StdioTransport {
        let router = McpRouter::builder(ClientResolver::new(
            None,
            reqwest::Client::new(),
            DepotConfig::default(),
        ))
        .server_info("test-server", "1.0.0")
        .build();
        StdioTransport::new(router)
    }

    #[tokio::test]
    async fn test_process_line_single_request() {
        let transport = transport();
        let response = transport
            .process_line(r#"{"jsonrpc": "2.0", "id": 1, "method": "ping"}"#)
            .await
            .unwrap();
        match response {
            JsonRpcResponseMessage::Single(JsonRpcResponse::Result(r)) => {
                assert_eq!(r.result, serde_json::json!({}));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_process_line_notification_yields_no_response() {
        let transport = transport();
        let response = transport
            .process_line(r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_process_line_invalid_json() {
        let transport = transport();
        let response = transport.process_line("{nope").await.unwrap();
        match response {
            JsonRpcResponseMessage::Single(JsonRpcResponse::Error(e)) => {
                assert_eq!(e.error.code, crate::error::ErrorCode::ParseError.code());
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }
}
