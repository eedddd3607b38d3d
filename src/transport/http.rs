//! Stateless streamable HTTP transport.
//!
//! One endpoint (`POST /mcp`) accepts single or batch JSON-RPC messages and
//! each request is handled independently; there is no server-side session
//! store. The
//! middleware chain is assembled declaratively, once, at build time: the auth
//! gate wraps the whole axum service (outermost, so rejections short-circuit
//! everything else), and the error reporter wraps the dispatch service where
//! collaborator failures are still typed.
//!
//! `GET /.well-known/oauth-protected-resource` is served without credentials
//! in all modes; no discovery metadata is currently published there.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use tower::ServiceBuilder;

use crate::auth::gate::{AuthGateLayer, GatePolicy};
use crate::config::{DISCOVERY_PATH, MCP_PATH};
use crate::context::{DelegatedToken, RequestAuth};
use crate::error::{Error, JsonRpcError, Result};
use crate::jsonrpc::JsonRpcService;
use crate::protocol::{
    JsonRpcMessage, JsonRpcNotification, JsonRpcResponse, JsonRpcResponseMessage,
};
use crate::report::{ErrorReportLayer, ErrorReportService};
use crate::router::McpRouter;

/// Maximum accepted request body, in bytes.
const BODY_LIMIT: usize = 4 * 1024 * 1024;

struct AppState {
    service: JsonRpcService<ErrorReportService<McpRouter>>,
    router: McpRouter,
}

/// HTTP transport for the MCP server.
pub struct HttpTransport {
    router: McpRouter,
    gate: Option<GatePolicy>,
}

impl HttpTransport {
    pub fn new(router: McpRouter) -> Self {
        Self { router, gate: None }
    }

    /// Install the auth gate. Without this call the transport serves
    /// unauthenticated requests (`--no-server-auth`).
    pub fn gate(mut self, policy: GatePolicy) -> Self {
        self.gate = Some(policy);
        self
    }

    /// Build the axum router with the full middleware chain.
    pub fn into_router(self) -> axum::Router {
        let dispatch = ServiceBuilder::new()
            .layer(ErrorReportLayer::new())
            .service(self.router.clone());

        let state = Arc::new(AppState {
            service: JsonRpcService::new(dispatch),
            router: self.router,
        });

        let mut app = axum::Router::new()
            .route(MCP_PATH, post(handle_post))
            .route(DISCOVERY_PATH, get(oauth_discovery))
            .with_state(state);

        if let Some(policy) = self.gate {
            tracing::info!(policy = ?policy, "installing auth gate");
            app = app.layer(AuthGateLayer::new(policy));
        } else {
            tracing::warn!("serving HTTP without authentication");
        }

        app
    }

    /// Serve on the given address until the process exits.
    pub async fn serve(self, addr: &str) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Transport(format!("failed to bind to {}: {}", addr, e)))?;

        tracing::info!(addr = %addr, "MCP HTTP transport listening");

        axum::serve(listener, self.into_router())
            .await
            .map_err(|e| Error::Transport(format!("server error: {}", e)))?;

        Ok(())
    }
}

/// Handle `POST /mcp`: JSON-RPC messages from the client.
async fn handle_post(
    State(state): State<Arc<AppState>>,
    req: axum::extract::Request,
) -> Response {
    // The gate stashed the delegated token (if any) in the request
    // extensions; moving it into RequestAuth hands ownership to this
    // request's dispatch and nothing else.
    let auth = RequestAuth::from_delegated(req.extensions().get::<DelegatedToken>().cloned());

    let body = match axum::body::to_bytes(req.into_body(), BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return json_rpc_error_response(JsonRpcError::invalid_request(format!(
                "Failed to read request body: {}",
                e
            )));
        }
    };

    let parsed: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return json_rpc_error_response(JsonRpcError::parse_error(format!(
                "Invalid JSON: {}",
                e
            )));
        }
    };

    // A message without an id is a notification: acknowledge, no body.
    if parsed.is_object() && parsed.get("id").is_none() {
        if let Ok(notification) = serde_json::from_value::<JsonRpcNotification>(parsed) {
            state.router.handle_notification(&notification.method);
        }
        return StatusCode::ACCEPTED.into_response();
    }

    let message: JsonRpcMessage = match serde_json::from_value(parsed) {
        Ok(m) => m,
        Err(e) => {
            return json_rpc_error_response(JsonRpcError::invalid_request(format!(
                "Invalid request: {}",
                e
            )));
        }
    };

    match state.service.call_message(message, auth).await {
        JsonRpcResponseMessage::Single(response) => Json(response).into_response(),
        JsonRpcResponseMessage::Batch(responses) => Json(responses).into_response(),
    }
}

/// OAuth 2.0 Protected Resource Metadata endpoint.
///
/// Reachable without credentials in all modes; discovery metadata is not
/// implemented, so this answers 501 with a JSON error body.
async fn oauth_discovery() -> Response {
    tracing::info!("OAuth discovery endpoint called");
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(serde_json::json!({
            "error": "OAuth discovery not implemented for transport: http"
        })),
    )
        .into_response()
}

fn json_rpc_error_response(error: JsonRpcError) -> Response {
    (
        StatusCode::OK,
        Json(JsonRpcResponse::error(None, error)),
    )
        .into_response()
}
