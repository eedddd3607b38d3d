//! Delegated-mode credential isolation under concurrency.
//!
//! The central hazard of delegated auth is one request's bearer token
//! becoming visible to another request running at the same time. These tests
//! drive the full HTTP stack with many simultaneous requests carrying unique
//! tokens and assert every response is bound to exactly the token its
//! request presented.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::future::join_all;
use serde_json::{json, Value};
use tower::ServiceExt;

use depot_mcp::auth::{ClientResolver, GatePolicy};
use depot_mcp::config::{DepotConfig, MCP_PATH};
use depot_mcp::protocol::CallToolResult;
use depot_mcp::router::McpRouter;
use depot_mcp::secret::SecretString;
use depot_mcp::tool::{NoParams, ToolBuilder};
use depot_mcp::transport::HttpTransport;
use depot_mcp::RequestContext;

/// Router with a tool that reports which token its resolved client is bound
/// to, via the non-reversible fingerprint.
fn echo_router(process_token: Option<&str>) -> McpRouter {
    let http = reqwest::Client::new();
    let depot = DepotConfig::default();
    let process = process_token.map(|t| {
        depot_mcp::DepotClient::with_token(http.clone(), &depot, SecretString::new(t))
    });

    let echo = ToolBuilder::new("echo_auth")
        .description("Echo the fingerprint of the resolved client token")
        .handler(|ctx: RequestContext, _input: NoParams| async move {
            let client = ctx.client()?;
            Ok(CallToolResult::text(client.token_fingerprint()))
        });

    McpRouter::builder(ClientResolver::new(process, http, depot))
        .server_info("isolation-test-server", "0.0.0")
        .tool(echo)
        .build()
}

fn delegated_app(router: McpRouter) -> axum::Router {
    HttpTransport::new(router)
        .gate(GatePolicy::Delegated)
        .into_router()
}

fn call_echo(token: &str, id: i64) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(MCP_PATH)
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::from(
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": "tools/call",
                "params": {"name": "echo_auth"}
            })
            .to_string(),
        ))
        .unwrap()
}

async fn response_text(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    value["result"]["content"][0]["text"]
        .as_str()
        .expect("text content")
        .to_string()
}

#[tokio::test]
async fn concurrent_requests_never_observe_each_others_tokens() {
    const REQUESTS: usize = 32;

    let app = delegated_app(echo_router(None));

    let futures: Vec<_> = (0..REQUESTS)
        .map(|i| {
            let app = app.clone();
            let token = format!("unique-token-{}", i);
            async move {
                let resp = app.oneshot(call_echo(&token, i as i64)).await.unwrap();
                assert_eq!(resp.status(), StatusCode::OK);
                (token, response_text(resp).await)
            }
        })
        .collect();

    for (token, fingerprint) in join_all(futures).await {
        assert_eq!(
            fingerprint,
            SecretString::new(token.as_str()).fingerprint(),
            "response for {} bound to a different request's token",
            token
        );
    }
}

#[tokio::test]
async fn repeated_resolution_within_a_request_is_stable() {
    let app = delegated_app(echo_router(None));
    // Same token on two sequential requests resolves to the same binding.
    let first = app
        .clone()
        .oneshot(call_echo("stable-token", 1))
        .await
        .unwrap();
    let second = app.oneshot(call_echo("stable-token", 2)).await.unwrap();
    assert_eq!(response_text(first).await, response_text(second).await);
}

#[tokio::test]
async fn process_client_takes_precedence_over_request_tokens() {
    // OAuth/CCG shape: with a process-lifetime client established, every
    // request resolves to it, never to a derived client.
    let app = HttpTransport::new(echo_router(Some("session-token")))
        .gate(GatePolicy::shared_secret(Some(SecretString::new("shared"))))
        .into_router();

    let req = Request::builder()
        .method("POST")
        .uri(MCP_PATH)
        .header("content-type", "application/json")
        .header("Authorization", "Bearer shared")
        .body(Body::from(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": {"name": "echo_auth"}
            })
            .to_string(),
        ))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        response_text(resp).await,
        SecretString::new("session-token").fingerprint()
    );
}

#[tokio::test]
async fn delegated_without_token_fails_with_distinguishable_error() {
    // Stdio-shaped dispatch: no gate ran, so the auth slot is empty and the
    // resolver must fail loudly rather than return an unusable client.
    let app = HttpTransport::new(echo_router(None)).into_router();

    let req = Request::builder()
        .method("POST")
        .uri(MCP_PATH)
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": {"name": "echo_auth"}
            })
            .to_string(),
        ))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(value.get("result").is_none());
    assert_eq!(value["error"]["code"], -32603);
    assert!(value["error"]["message"]
        .as_str()
        .unwrap()
        .contains("bearer token"));
}
