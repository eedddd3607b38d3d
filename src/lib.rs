//! # depot-mcp
//!
//! MCP (Model Context Protocol) server for the Depot content API.
//!
//! The server exposes Depot file, folder, user, and search operations as MCP
//! tools over stdio or stateless streamable HTTP, under one of three
//! authentication strategies fixed at startup:
//!
//! - **oauth**: a pre-provisioned OAuth refresh token is exchanged once at
//!   startup for a process-lifetime session shared by all requests.
//! - **ccg**: a client-credentials grant establishes the same kind of
//!   process-lifetime session under a service identity.
//! - **delegated**: no startup session. An upstream proxy that already ran
//!   the OAuth flow forwards the Depot access token as the request's bearer
//!   token, and a request-scoped client is derived from it.
//!
//! ## Request pipeline
//!
//! ```text
//! HTTP request
//!   → AuthGateService         validate secret / extract delegated token
//!   → POST /mcp handler       JSON-RPC framing (JsonRpcService)
//!     → ErrorReportService    log diagnostics for failures, re-raise
//!       → McpRouter           dispatch to the tool
//!         → tool handler      ClientResolver → Depot API call
//! ```
//!
//! The gate runs outermost, so rejected requests never reach dispatch. The
//! delegated token travels inside the request object itself (HTTP extensions
//! into [`context::RequestAuth`]), never through shared state, so concurrent
//! requests cannot observe each other's credentials.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use depot_mcp::auth::{ClientResolver, GatePolicy};
//! use depot_mcp::config::DepotConfig;
//! use depot_mcp::router::McpRouter;
//! use depot_mcp::tools::{self, ServerInfo};
//! use depot_mcp::transport::HttpTransport;
//!
//! # async fn run() -> depot_mcp::error::Result<()> {
//! let http = depot_mcp::depot::http_client()?;
//! let resolver = ClientResolver::new(None, http, DepotConfig::from_env());
//! let router = McpRouter::builder(resolver)
//!     .server_info("Depot MCP Server", env!("CARGO_PKG_VERSION"))
//!     .tools(tools::all(ServerInfo::default()))
//!     .build();
//!
//! HttpTransport::new(router)
//!     .gate(GatePolicy::Delegated)
//!     .serve("0.0.0.0:8001")
//!     .await
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod context;
pub mod depot;
pub mod error;
pub mod jsonrpc;
pub mod protocol;
pub mod report;
pub mod router;
pub mod secret;
pub mod tool;
pub mod tools;
pub mod transport;

// Re-exports
pub use auth::{AuthGateLayer, ClientResolver, GatePolicy, Session, SessionError};
pub use config::{AuthMode, DepotConfig, ServerConfig, TransportKind};
pub use context::{RequestAuth, RequestContext};
pub use depot::{DepotClient, DepotError};
pub use error::{BoxError, Error, Result};
pub use protocol::{CallToolResult, Content};
pub use report::{DiagnosticRecord, Diagnose, ErrorReportLayer};
pub use router::McpRouter;
pub use secret::SecretString;
pub use tool::{NoParams, Tool, ToolBuilder};
pub use transport::{HttpTransport, StdioTransport};
