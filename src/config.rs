//! Server and upstream configuration.
//!
//! The authentication mode and transport are fixed at process start from CLI
//! flags; credential material is sourced from the process environment.

use std::fmt;

use clap::ValueEnum;

use crate::secret::SecretString;

/// Environment variable holding the shared secret for the standard auth check.
pub const AUTH_TOKEN_ENV: &str = "DEPOT_MCP_AUTH_TOKEN";

/// Default MCP endpoint path for the HTTP transport.
pub const MCP_PATH: &str = "/mcp";

/// OAuth protected-resource discovery path, reachable without credentials.
pub const DISCOVERY_PATH: &str = "/.well-known/oauth-protected-resource";

/// Transports the server can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Line-delimited JSON-RPC over stdin/stdout.
    Stdio,
    /// Stateless streamable HTTP (`POST /mcp`).
    Http,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Stdio => "stdio",
            TransportKind::Http => "http",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How this server authenticates against the Depot API.
///
/// Selected once at startup and immutable for the process lifetime. `OAuth`
/// and `Ccg` establish a single process-lifetime client; `Delegated` derives
/// a client per request from the caller's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthMode {
    /// Pre-provisioned OAuth session (refresh token exchanged at startup).
    #[value(name = "oauth")]
    OAuth,
    /// Client-credentials grant (service identity, no per-user context).
    #[value(name = "ccg")]
    Ccg,
    /// Bearer token passthrough from an upstream proxy.
    #[value(name = "delegated")]
    Delegated,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::OAuth => "oauth",
            AuthMode::Ccg => "ccg",
            AuthMode::Delegated => "delegated",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level server configuration, assembled in `main` from CLI flags.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub transport: TransportKind,
    pub host: String,
    pub port: u16,
    pub auth_mode: AuthMode,
    /// When false (`--no-server-auth`), the HTTP gate is not installed.
    pub require_auth: bool,
    pub server_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Stdio,
            host: "0.0.0.0".to_string(),
            port: 8001,
            auth_mode: AuthMode::OAuth,
            require_auth: true,
            server_name: "Depot MCP Server".to_string(),
        }
    }
}

impl ServerConfig {
    /// The shared secret expected by the standard auth check, if configured.
    ///
    /// An unset or empty `DEPOT_MCP_AUTH_TOKEN` counts as "not configured";
    /// the gate then rejects every non-exempt request.
    pub fn shared_secret() -> Option<SecretString> {
        std::env::var(AUTH_TOKEN_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .map(SecretString::new)
    }

    /// Socket address string for the HTTP transport.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upstream Depot API configuration, sourced from the environment.
#[derive(Debug, Clone)]
pub struct DepotConfig {
    /// Base URL of the Depot content API.
    pub api_base: String,
    /// OAuth token endpoint used by the startup handshakes.
    pub token_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    /// Enterprise/service subject for the client-credentials grant.
    pub subject_id: Option<String>,
    /// Pre-provisioned refresh token for the OAuth mode.
    pub refresh_token: Option<SecretString>,
}

impl DepotConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://api.depot.example/2.0";
    pub const DEFAULT_TOKEN_URL: &'static str = "https://auth.depot.example/oauth2/token";

    pub fn from_env() -> Self {
        fn var(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        }

        Self {
            api_base: var("DEPOT_API_BASE").unwrap_or_else(|| Self::DEFAULT_API_BASE.to_string()),
            token_url: var("DEPOT_TOKEN_URL")
                .unwrap_or_else(|| Self::DEFAULT_TOKEN_URL.to_string()),
            client_id: var("DEPOT_CLIENT_ID"),
            client_secret: var("DEPOT_CLIENT_SECRET").map(SecretString::new),
            subject_id: var("DEPOT_SUBJECT_ID"),
            refresh_token: var("DEPOT_REFRESH_TOKEN").map(SecretString::new),
        }
    }
}

impl Default for DepotConfig {
    fn default() -> Self {
        Self {
            api_base: Self::DEFAULT_API_BASE.to_string(),
            token_url: Self::DEFAULT_TOKEN_URL.to_string(),
            client_id: None,
            client_secret: None,
            subject_id: None,
            refresh_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.transport, TransportKind::Stdio);
        assert_eq!(config.port, 8001);
        assert_eq!(config.auth_mode, AuthMode::OAuth);
        assert!(config.require_auth);
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(AuthMode::OAuth.to_string(), "oauth");
        assert_eq!(AuthMode::Ccg.to_string(), "ccg");
        assert_eq!(AuthMode::Delegated.to_string(), "delegated");
        assert_eq!(TransportKind::Http.to_string(), "http");
    }

    #[test]
    fn test_depot_config_defaults() {
        let config = DepotConfig::default();
        assert_eq!(config.api_base, DepotConfig::DEFAULT_API_BASE);
        assert!(config.client_id.is_none());
        assert!(config.refresh_token.is_none());
    }
}
