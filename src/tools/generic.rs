//! Connectivity and server-introspection tools.

use serde_json::json;

use crate::context::RequestContext;
use crate::protocol::CallToolResult;
use crate::tool::{NoParams, Tool, ToolBuilder};

/// Static facts about this server instance, captured at startup.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    pub server_name: String,
    pub transport: String,
    pub auth_mode: String,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// `depot_who_am_i`: fetch the current user. Doubles as a connectivity and
/// credential check.
pub fn who_am_i() -> Tool {
    ToolBuilder::new("depot_who_am_i")
        .description(
            "Get the current user's information. Also useful to check the connection status.",
        )
        .handler(|ctx: RequestContext, _input: NoParams| async move {
            let client = ctx.client()?;
            let user = client.current_user().await?;
            Ok(CallToolResult::json(&user))
        })
}

/// `depot_server_info`: report server name, version, transport, and auth
/// mode. Needs no upstream client.
pub fn server_info(info: ServerInfo) -> Tool {
    ToolBuilder::new("depot_server_info")
        .description("Returns information about this MCP server instance.")
        .handler(move |_ctx: RequestContext, _input: NoParams| {
            let info = info.clone();
            async move {
                let mut value = json!({
                    "server_name": info.server_name,
                    "version": env!("CARGO_PKG_VERSION"),
                    "transport": info.transport,
                    "depot_auth": info.auth_mode,
                });
                if let (Some(host), Some(port)) = (info.host, info.port) {
                    value["host"] = json!(host);
                    value["port"] = json!(port.to_string());
                }
                Ok(CallToolResult::json(&value))
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::resolver::ClientResolver;
    use crate::config::DepotConfig;
    use crate::context::RequestAuth;
    use crate::protocol::{Content, RequestId};

    fn ctx() -> RequestContext {
        RequestContext::new(
            RequestId::Number(1),
            RequestAuth::none(),
            ClientResolver::new(None, reqwest::Client::new(), DepotConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_server_info_reports_auth_mode_without_client() {
        let tool = server_info(ServerInfo {
            server_name: "Depot MCP Server".to_string(),
            transport: "http".to_string(),
            auth_mode: "delegated".to_string(),
            host: Some("0.0.0.0".to_string()),
            port: Some(8001),
        });
        // Works even though no client can be resolved.
        let result = tool.call(ctx(), serde_json::Value::Null).await.unwrap();
        let Content::Text { text } = &result.content[0];
        let value: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(value["depot_auth"], "delegated");
        assert_eq!(value["transport"], "http");
        assert_eq!(value["port"], "8001");
    }

    #[tokio::test]
    async fn test_who_am_i_requires_client() {
        let err = who_am_i()
            .call(ctx(), serde_json::Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::ClientUnavailable(_)));
    }
}
