//! Depot content API client.
//!
//! A thin, cloneable wrapper over [`reqwest::Client`] bound to one bearer
//! token. The server holds at most one process-lifetime instance (OAuth/CCG
//! modes); in delegated mode an instance is derived per request from the
//! caller's token and discarded with the request.
//!
//! Errors preserve the upstream HTTP status and response body so the error
//! reporter can surface them without re-contacting the API.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::config::DepotConfig;
use crate::secret::SecretString;

const USER_AGENT: &str = concat!("depot-mcp/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure raised by a Depot API call.
#[derive(Debug, thiserror::Error)]
pub enum DepotError {
    /// The API answered with a non-success status.
    #[error("depot api returned HTTP {status}{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Api {
        status: u16,
        /// Vendor error code, when the response body carried one.
        code: Option<String>,
        message: Option<String>,
        /// Raw response body text, kept for diagnostics.
        body: Option<String>,
    },

    /// The request never produced an HTTP response.
    #[error("depot transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl DepotError {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            DepotError::Api { status, .. } => Some(*status),
            DepotError::Transport(err) => err.status().map(|s| s.as_u16()),
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            DepotError::Api { code, .. } => code.as_deref(),
            DepotError::Transport(_) => None,
        }
    }

    pub fn response_body(&self) -> Option<&str> {
        match self {
            DepotError::Api { body, .. } => body.as_deref(),
            DepotError::Transport(_) => None,
        }
    }
}

/// Error body shape used by the Depot API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Build the shared HTTP connector used by the session handshake and every
/// Depot client this process creates.
pub fn http_client() -> Result<reqwest::Client, DepotError> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Authenticated handle to the Depot content API.
///
/// Cloning is cheap and shares the underlying connection pool; the token is
/// immutable for the lifetime of the handle.
#[derive(Clone)]
pub struct DepotClient {
    http: reqwest::Client,
    api_base: String,
    token: SecretString,
}

impl std::fmt::Debug for DepotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepotClient")
            .field("api_base", &self.api_base)
            .field("token", &self.token)
            .finish()
    }
}

impl DepotClient {
    /// Create a client bound to the given access token.
    pub fn with_token(http: reqwest::Client, config: &DepotConfig, token: SecretString) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Non-reversible identifier of the token this client is bound to.
    pub fn token_fingerprint(&self) -> String {
        self.token.fingerprint()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, DepotError> {
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .bearer_auth(self.token.expose())
            .send()
            .await?;
        Self::parse_json(response).await
    }

    async fn parse_json(response: reqwest::Response) -> Result<Value, DepotError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        Err(Self::api_error(status, response.text().await.ok()))
    }

    fn api_error(status: reqwest::StatusCode, body: Option<String>) -> DepotError {
        let parsed = body
            .as_deref()
            .and_then(|text| serde_json::from_str::<ApiErrorBody>(text).ok());
        DepotError::Api {
            status: status.as_u16(),
            code: parsed.as_ref().and_then(|e| e.code.clone()),
            message: parsed.and_then(|e| e.message),
            body,
        }
    }

    /// `GET /users/me`: the identity this client acts as.
    pub async fn current_user(&self) -> Result<Value, DepotError> {
        self.get_json("/users/me", &[]).await
    }

    /// `GET /users/{id}`
    pub async fn get_user(&self, user_id: &str) -> Result<Value, DepotError> {
        self.get_json(&format!("/users/{}", user_id), &[]).await
    }

    /// `GET /users`
    pub async fn list_users(&self, limit: Option<u32>) -> Result<Value, DepotError> {
        let mut query = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        self.get_json("/users", &query).await
    }

    /// `GET /files/{id}`
    pub async fn file_info(&self, file_id: &str) -> Result<Value, DepotError> {
        self.get_json(&format!("/files/{}", file_id), &[]).await
    }

    /// `GET /files/{id}/content`: textual file content.
    pub async fn file_text(&self, file_id: &str) -> Result<String, DepotError> {
        let response = self
            .http
            .get(self.url(&format!("/files/{}/content", file_id)))
            .bearer_auth(self.token.expose())
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.text().await?);
        }
        Err(Self::api_error(status, response.text().await.ok()))
    }

    /// `GET /folders/{id}/items`
    pub async fn folder_items(&self, folder_id: &str) -> Result<Value, DepotError> {
        self.get_json(&format!("/folders/{}/items", folder_id), &[])
            .await
    }

    /// `POST /folders`
    pub async fn create_folder(&self, name: &str, parent_id: &str) -> Result<Value, DepotError> {
        let response = self
            .http
            .post(self.url("/folders"))
            .bearer_auth(self.token.expose())
            .json(&serde_json::json!({
                "name": name,
                "parent": { "id": parent_id },
            }))
            .send()
            .await?;
        Self::parse_json(response).await
    }

    /// `DELETE /folders/{id}`. Returns no body on success.
    pub async fn delete_folder(&self, folder_id: &str, recursive: bool) -> Result<(), DepotError> {
        let response = self
            .http
            .delete(self.url(&format!("/folders/{}", folder_id)))
            .query(&[("recursive", recursive.to_string())])
            .bearer_auth(self.token.expose())
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::api_error(status, response.text().await.ok()))
    }

    /// `GET /search`
    pub async fn search(&self, query: &str, limit: Option<u32>) -> Result<Value, DepotError> {
        let mut params = vec![("query", query.to_string())];
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        self.get_json("/search", &params).await
    }
}
