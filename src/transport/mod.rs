//! Server transports.
//!
//! - [`stdio`]: line-delimited JSON-RPC over stdin/stdout, for local use.
//! - [`http`]: stateless streamable HTTP with the auth gate installed.

pub mod http;
pub mod stdio;

pub use http::HttpTransport;
pub use stdio::StdioTransport;
