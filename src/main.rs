//! Entry point for the Depot MCP server.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use depot_mcp::auth::{ClientResolver, GatePolicy, Session};
use depot_mcp::config::{AuthMode, DepotConfig, ServerConfig, TransportKind};
use depot_mcp::error::BoxError;
use depot_mcp::router::McpRouter;
use depot_mcp::tools::{self, ServerInfo};
use depot_mcp::transport::{HttpTransport, StdioTransport};
use depot_mcp::{depot, Tool};

/// Depot MCP Server
#[derive(Debug, Parser)]
#[command(name = "depot-mcp", version, about)]
struct Cli {
    /// Transport type
    #[arg(long, value_enum, default_value_t = TransportKind::Stdio)]
    transport: TransportKind,

    /// Host for the HTTP transport
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port for the HTTP transport
    #[arg(long, default_value_t = 8001)]
    port: u16,

    /// Authentication mode for the Depot API
    #[arg(long = "depot-auth", value_enum, default_value_t = AuthMode::OAuth)]
    depot_auth: AuthMode,

    /// Disable server authentication (for development only)
    #[arg(long = "no-server-auth")]
    no_server_auth: bool,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        let server_name = format!(
            "Depot MCP {} Server",
            self.transport.as_str().to_uppercase()
        );
        ServerConfig {
            transport: self.transport,
            host: self.host,
            port: self.port,
            auth_mode: self.depot_auth,
            require_auth: !self.no_server_auth,
            server_name,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config();
    let depot_config = DepotConfig::from_env();

    match run(config, depot_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig, depot_config: DepotConfig) -> Result<(), BoxError> {
    let http = depot::http_client()?;

    // Startup handshake. A failure here is fatal: the server must not begin
    // serving without the session its mode requires.
    let session = Session::establish(config.auth_mode, &depot_config, &http).await?;

    if config.auth_mode == AuthMode::Delegated && config.transport == TransportKind::Stdio {
        tracing::warn!(
            "delegated mode over stdio: no gate extracts bearer tokens, \
             every tool call will fail to resolve a client"
        );
    }

    let resolver = ClientResolver::new(session.client().cloned(), http, depot_config);
    let router = build_router(&config, resolver);

    tracing::info!(
        server = %config.server_name,
        transport = %config.transport,
        auth = %config.auth_mode,
        tools = router.tool_count(),
        "starting server"
    );

    match config.transport {
        TransportKind::Stdio => {
            StdioTransport::new(router).run().await?;
        }
        TransportKind::Http => {
            let mut transport = HttpTransport::new(router);
            if config.require_auth {
                transport = transport.gate(gate_policy(config.auth_mode));
            }
            transport.serve(&config.bind_addr()).await?;
        }
    }

    session.shutdown();
    Ok(())
}

fn gate_policy(mode: AuthMode) -> GatePolicy {
    match mode {
        AuthMode::Delegated => GatePolicy::Delegated,
        AuthMode::OAuth | AuthMode::Ccg => {
            GatePolicy::shared_secret(ServerConfig::shared_secret())
        }
    }
}

fn build_router(config: &ServerConfig, resolver: ClientResolver) -> McpRouter {
    let info = ServerInfo {
        server_name: config.server_name.clone(),
        transport: config.transport.to_string(),
        auth_mode: config.auth_mode.to_string(),
        host: matches!(config.transport, TransportKind::Http).then(|| config.host.clone()),
        port: matches!(config.transport, TransportKind::Http).then_some(config.port),
    };

    let tools: Vec<Tool> = tools::all(info);

    McpRouter::builder(resolver)
        .server_info(&config.server_name, env!("CARGO_PKG_VERSION"))
        .instructions(
            "Tools for working with Depot files, folders, users, and search. \
             Call depot_who_am_i to verify connectivity and credentials.",
        )
        .tools(tools)
        .build()
}
