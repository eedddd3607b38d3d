//! JSON-RPC 2.0 framing over the dispatch chain.
//!
//! [`JsonRpcService`] wraps the dispatch service (router plus middleware)
//! and handles request/response conversion for single and batch messages.
//! It is where typed dispatch errors become wire errors, the final mapping
//! the error reporter deliberately leaves to this layer.

use futures::future::join_all;
use tower_service::Service;

use crate::context::RequestAuth;
use crate::error::{Error, JsonRpcError};
use crate::protocol::{
    JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, JsonRpcResponseMessage, McpRequest,
};
use crate::router::{RouterRequest, RouterResponse};

/// Service that handles JSON-RPC framing around a dispatch service.
#[derive(Debug, Clone)]
pub struct JsonRpcService<S> {
    inner: S,
}

impl<S> JsonRpcService<S>
where
    S: Service<RouterRequest, Response = RouterResponse, Error = Error>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    /// Create a new JSON-RPC service wrapping the given dispatch service.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Process a single JSON-RPC request.
    pub async fn call_single(&self, req: JsonRpcRequest, auth: RequestAuth) -> JsonRpcResponse {
        process_single(self.inner.clone(), req, auth).await
    }

    /// Process a JSON-RPC message (single or batch).
    ///
    /// Batch entries are dispatched concurrently. All entries of a batch
    /// share the `auth` slot: they arrived on one transport request and thus
    /// one credential.
    pub async fn call_message(
        &self,
        msg: JsonRpcMessage,
        auth: RequestAuth,
    ) -> JsonRpcResponseMessage {
        match msg {
            JsonRpcMessage::Single(req) => {
                JsonRpcResponseMessage::Single(self.call_single(req, auth).await)
            }
            JsonRpcMessage::Batch(requests) => {
                if requests.is_empty() {
                    return JsonRpcResponseMessage::Single(JsonRpcResponse::error(
                        None,
                        JsonRpcError::invalid_request("Empty batch request"),
                    ));
                }

                let futures: Vec<_> = requests
                    .into_iter()
                    .map(|req| process_single(self.inner.clone(), req, auth.clone()))
                    .collect();

                JsonRpcResponseMessage::Batch(join_all(futures).await)
            }
        }
    }
}

async fn process_single<S>(mut inner: S, req: JsonRpcRequest, auth: RequestAuth) -> JsonRpcResponse
where
    S: Service<RouterRequest, Response = RouterResponse, Error = Error> + Send + 'static,
    S::Future: Send,
{
    if let Err(e) = req.validate() {
        return JsonRpcResponse::error(Some(req.id), e);
    }

    let mcp_request = match McpRequest::from_jsonrpc(&req) {
        Ok(r) => r,
        Err(e) => return JsonRpcResponse::error(Some(req.id), e),
    };

    let router_req = RouterRequest {
        id: req.id.clone(),
        inner: mcp_request,
        auth,
    };

    match inner.call(router_req).await {
        Ok(response) => response.into_jsonrpc(),
        Err(error) => JsonRpcResponse::error(Some(req.id), error.into_jsonrpc()),
    }
}
