//! Failure reporting middleware for the dispatch chain.
//!
//! [`ErrorReportLayer`] wraps the dispatch service, built once at
//! server-build time. It observes collaborator failures on the service's
//! error channel, extracts a [`DiagnosticRecord`], emits one structured log
//! entry, and returns the error unchanged. It never swallows or translates;
//! the JSON-RPC framing layer owns the final wire mapping.
//!
//! Extraction is explicit per failure kind via [`Diagnose`] and is total: a
//! failure lacking status, code, or body still produces a record.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde_json::Value;
use tower::Layer;
use tower_service::Service;

use crate::depot::DepotError;
use crate::error::Error;
use crate::router::{RouterRequest, RouterResponse};

/// Normalized view of a failure, used for one log emission.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticRecord {
    /// Failure kind label (e.g. `upstream_api`, `client_unavailable`).
    pub kind: &'static str,
    pub message: String,
    pub http_status: Option<u16>,
    /// Vendor error code from the upstream response, when present.
    pub error_code: Option<String>,
    /// Upstream response body parsed as JSON, when parseable.
    pub response_body: Option<Value>,
    /// Raw body text fallback when the body was not valid JSON.
    pub response_text: Option<String>,
}

impl DiagnosticRecord {
    fn bare(kind: &'static str, message: String) -> Self {
        Self {
            kind,
            message,
            http_status: None,
            error_code: None,
            response_body: None,
            response_text: None,
        }
    }
}

/// Extract a [`DiagnosticRecord`] from a failure. Must never fail.
pub trait Diagnose {
    fn diagnostics(&self) -> DiagnosticRecord;
}

impl Diagnose for DepotError {
    fn diagnostics(&self) -> DiagnosticRecord {
        let mut record = DiagnosticRecord::bare("upstream_api", self.to_string());
        record.http_status = self.http_status();
        record.error_code = self.error_code().map(str::to_owned);
        if let Some(body) = self.response_body() {
            match serde_json::from_str::<Value>(body) {
                Ok(parsed) => record.response_body = Some(parsed),
                Err(_) => record.response_text = Some(body.to_string()),
            }
        }
        record
    }
}

impl Diagnose for Error {
    fn diagnostics(&self) -> DiagnosticRecord {
        match self {
            Error::Upstream(err) => err.diagnostics(),
            Error::ClientUnavailable(err) => {
                DiagnosticRecord::bare("client_unavailable", err.to_string())
            }
            Error::JsonRpc(err) => DiagnosticRecord::bare("protocol", err.message.clone()),
            Error::Serialization(err) => {
                DiagnosticRecord::bare("serialization", err.to_string())
            }
            Error::Transport(message) => DiagnosticRecord::bare("transport", message.clone()),
            Error::Internal(message) => DiagnosticRecord::bare("internal", message.clone()),
        }
    }
}

/// Tower layer installing the [`ErrorReportService`] middleware.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorReportLayer {
    _priv: (),
}

impl ErrorReportLayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> Layer<S> for ErrorReportLayer {
    type Service = ErrorReportService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorReportService { inner }
    }
}

/// Tower service created by [`ErrorReportLayer`].
#[derive(Debug, Clone)]
pub struct ErrorReportService<S> {
    inner: S,
}

impl<S> Service<RouterRequest> for ErrorReportService<S>
where
    S: Service<RouterRequest, Response = RouterResponse, Error = Error>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = RouterResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<RouterResponse, Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: RouterRequest) -> Self::Future {
        let method = req.inner.method_name().to_string();
        let target = req.inner.target().map(str::to_owned);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match inner.call(req).await {
                Ok(response) => Ok(response),
                Err(error) => {
                    let record = error.diagnostics();
                    tracing::error!(
                        method = %method,
                        target = target.as_deref(),
                        kind = record.kind,
                        error_message = %record.message,
                        http_status = record.http_status,
                        error_code = record.error_code.as_deref(),
                        response_body = record.response_body.as_ref().map(|b| b.to_string()).as_deref(),
                        response_text = record.response_text.as_deref(),
                        "request handler failed"
                    );
                    Err(error)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::resolver::ClientUnavailable;
    use crate::context::RequestAuth;
    use crate::error::JsonRpcError;
    use crate::protocol::{McpRequest, RequestId};
    use serde_json::json;
    use tower::ServiceExt;

    #[test]
    fn test_api_error_with_json_body() {
        let err = DepotError::Api {
            status: 404,
            code: Some("not_found".to_string()),
            message: Some("Item not found".to_string()),
            body: Some(r#"{"code": "not_found", "message": "Item not found"}"#.to_string()),
        };
        let record = err.diagnostics();
        assert_eq!(record.kind, "upstream_api");
        assert_eq!(record.http_status, Some(404));
        assert_eq!(record.error_code.as_deref(), Some("not_found"));
        assert_eq!(record.response_body.as_ref().unwrap()["code"], "not_found");
        assert!(record.response_text.is_none());
    }

    #[test]
    fn test_api_error_with_text_body_falls_back_to_raw() {
        let err = DepotError::Api {
            status: 502,
            code: None,
            message: None,
            body: Some("<html>bad gateway</html>".to_string()),
        };
        let record = err.diagnostics();
        assert!(record.response_body.is_none());
        assert_eq!(
            record.response_text.as_deref(),
            Some("<html>bad gateway</html>")
        );
    }

    #[test]
    fn test_extraction_tolerates_bare_errors() {
        let record = Error::Internal("boom".to_string()).diagnostics();
        assert_eq!(record.kind, "internal");
        assert_eq!(record.message, "boom");
        assert!(record.http_status.is_none());
        assert!(record.error_code.is_none());
        assert!(record.response_body.is_none());

        let record = Error::from(ClientUnavailable::delegated_token_missing()).diagnostics();
        assert_eq!(record.kind, "client_unavailable");
    }

    #[test]
    fn test_protocol_error_record() {
        let record = Error::JsonRpc(JsonRpcError::invalid_params("bad")).diagnostics();
        assert_eq!(record.kind, "protocol");
        assert_eq!(record.message, "bad");
    }

    /// Inner dispatch stub that always fails with the given error factory.
    #[derive(Clone)]
    struct FailingService {
        status: u16,
    }

    impl Service<RouterRequest> for FailingService {
        type Response = RouterResponse;
        type Error = Error;
        type Future = Pin<Box<dyn Future<Output = Result<RouterResponse, Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: RouterRequest) -> Self::Future {
            let status = self.status;
            Box::pin(async move {
                Err(Error::Upstream(DepotError::Api {
                    status,
                    code: Some("rate_limited".to_string()),
                    message: None,
                    body: Some(json!({"code": "rate_limited"}).to_string()),
                }))
            })
        }
    }

    #[derive(Clone)]
    struct OkDispatch;

    impl Service<RouterRequest> for OkDispatch {
        type Response = RouterResponse;
        type Error = Error;
        type Future = Pin<Box<dyn Future<Output = Result<RouterResponse, Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: RouterRequest) -> Self::Future {
            Box::pin(async move {
                Ok(RouterResponse {
                    id: req.id,
                    inner: Ok(json!({"ok": true})),
                })
            })
        }
    }

    fn request() -> RouterRequest {
        RouterRequest {
            id: RequestId::Number(1),
            inner: McpRequest::Ping,
            auth: RequestAuth::none(),
        }
    }

    #[tokio::test]
    async fn test_reporter_reraises_error_unchanged() {
        let mut service = ErrorReportLayer::new().layer(FailingService { status: 429 });
        let err = service
            .ready()
            .await
            .unwrap()
            .call(request())
            .await
            .unwrap_err();
        match err {
            Error::Upstream(DepotError::Api { status, code, .. }) => {
                assert_eq!(status, 429);
                assert_eq!(code.as_deref(), Some("rate_limited"));
            }
            other => panic!("error was translated: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reporter_forwards_success_untouched() {
        let mut service = ErrorReportLayer::new().layer(OkDispatch);
        let response = service
            .ready()
            .await
            .unwrap()
            .call(request())
            .await
            .unwrap();
        assert_eq!(response.inner.unwrap(), json!({"ok": true}));
    }
}
