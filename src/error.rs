//! Error types for depot-mcp.

use serde::{Deserialize, Serialize};

use crate::auth::resolver::ClientUnavailable;
use crate::depot::DepotError;

/// Boxed error type for transport entry points.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Standard JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    /// Invalid JSON was received
    ParseError = -32700,
    /// The JSON sent is not a valid Request object
    InvalidRequest = -32600,
    /// The method does not exist / is not available
    MethodNotFound = -32601,
    /// Invalid method parameter(s)
    InvalidParams = -32602,
    /// Internal JSON-RPC error
    InternalError = -32603,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("Method not found: {}", method),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// depot-mcp error type.
///
/// Collaborator failures (`Upstream`, `ClientUnavailable`) stay typed while
/// they travel through the dispatch middleware so the error reporter can
/// extract diagnostics; the JSON-RPC framing layer owns the final mapping to
/// wire errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("JSON-RPC error: {0:?}")]
    JsonRpc(JsonRpcError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Upstream(#[from] DepotError),

    #[error(transparent)]
    ClientUnavailable(#[from] ClientUnavailable),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRpcError> for Error {
    fn from(err: JsonRpcError) -> Self {
        Error::JsonRpc(err)
    }
}

impl Error {
    /// Map to the JSON-RPC error object sent on the wire.
    ///
    /// Protocol-level errors keep their original code; collaborator failures
    /// become internal errors, as the transport owns final status mapping.
    pub fn into_jsonrpc(self) -> JsonRpcError {
        match self {
            Error::JsonRpc(err) => err,
            other => JsonRpcError::internal_error(other.to_string()),
        }
    }
}

/// Result type alias for depot-mcp
pub type Result<T> = std::result::Result<T, Error>;
