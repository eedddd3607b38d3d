//! Startup session lifecycle.
//!
//! OAuth and CCG modes perform their token handshake exactly once, before any
//! transport binds; the resulting client lives for the process lifetime. A
//! handshake failure is fatal: the server must not begin serving without the
//! session it was configured to hold. Delegated mode establishes nothing.

use serde::Deserialize;

use crate::config::{AuthMode, DepotConfig};
use crate::depot::{DepotClient, DepotError};
use crate::secret::SecretString;

/// Failure establishing the startup session. Fatal to process start.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("missing credential for {mode} mode: {name} is not set")]
    MissingCredential { mode: AuthMode, name: &'static str },

    #[error("token handshake failed: {0}")]
    Handshake(#[from] DepotError),

    #[error("token endpoint rejected the grant: {error}{}", .description.as_deref().map(|d| format!(" ({})", d)).unwrap_or_default())]
    Rejected {
        error: String,
        description: Option<String>,
    },
}

/// Response from the Depot token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<SecretString>,
    #[allow(dead_code)]
    token_type: Option<String>,
    #[allow(dead_code)]
    expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
}

/// The established authentication session of this process.
#[derive(Debug)]
pub struct Session {
    mode: AuthMode,
    client: Option<DepotClient>,
}

impl Session {
    /// Perform the startup handshake for `mode`.
    ///
    /// `Delegated` returns immediately with no client and cannot fail; the
    /// other modes exchange their configured credential for an access token
    /// at the Depot token endpoint.
    pub async fn establish(
        mode: AuthMode,
        depot: &DepotConfig,
        http: &reqwest::Client,
    ) -> Result<Self, SessionError> {
        let client = match mode {
            AuthMode::Delegated => {
                tracing::info!("delegated mode: clients will be derived per request");
                None
            }
            AuthMode::Ccg => {
                let token = client_credentials_grant(depot, http).await?;
                tracing::info!(token = %token.fingerprint(), "established CCG session");
                Some(DepotClient::with_token(http.clone(), depot, token))
            }
            AuthMode::OAuth => {
                let token = refresh_token_grant(depot, http).await?;
                tracing::info!(token = %token.fingerprint(), "established OAuth session");
                Some(DepotClient::with_token(http.clone(), depot, token))
            }
        };

        Ok(Self { mode, client })
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// The process-lifetime client, absent in delegated mode.
    pub fn client(&self) -> Option<&DepotClient> {
        self.client.as_ref()
    }

    /// Release held resources. Best-effort; the connection pool drains on
    /// drop and no external side effect is required.
    pub fn shutdown(self) {
        tracing::debug!(mode = %self.mode, "session shut down");
    }
}

/// `grant_type=client_credentials` with the service identity.
async fn client_credentials_grant(
    depot: &DepotConfig,
    http: &reqwest::Client,
) -> Result<SecretString, SessionError> {
    let client_id = require(depot.client_id.as_deref(), AuthMode::Ccg, "DEPOT_CLIENT_ID")?;
    let client_secret = require(
        depot.client_secret.as_ref().map(|s| s.expose()),
        AuthMode::Ccg,
        "DEPOT_CLIENT_SECRET",
    )?;
    let subject_id = require(
        depot.subject_id.as_deref(),
        AuthMode::Ccg,
        "DEPOT_SUBJECT_ID",
    )?;

    request_token(
        depot,
        http,
        &[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("subject_id", subject_id),
        ],
    )
    .await
}

/// `grant_type=refresh_token` with the pre-provisioned OAuth refresh token.
async fn refresh_token_grant(
    depot: &DepotConfig,
    http: &reqwest::Client,
) -> Result<SecretString, SessionError> {
    let client_id = require(
        depot.client_id.as_deref(),
        AuthMode::OAuth,
        "DEPOT_CLIENT_ID",
    )?;
    let client_secret = require(
        depot.client_secret.as_ref().map(|s| s.expose()),
        AuthMode::OAuth,
        "DEPOT_CLIENT_SECRET",
    )?;
    let refresh_token = require(
        depot.refresh_token.as_ref().map(|s| s.expose()),
        AuthMode::OAuth,
        "DEPOT_REFRESH_TOKEN",
    )?;

    request_token(
        depot,
        http,
        &[
            ("grant_type", "refresh_token"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
        ],
    )
    .await
}

fn require<'a>(
    value: Option<&'a str>,
    mode: AuthMode,
    name: &'static str,
) -> Result<&'a str, SessionError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(SessionError::MissingCredential { mode, name })
}

async fn request_token(
    depot: &DepotConfig,
    http: &reqwest::Client,
    form: &[(&str, &str)],
) -> Result<SecretString, SessionError> {
    let response = http
        .post(&depot.token_url)
        .form(form)
        .send()
        .await
        .map_err(DepotError::from)?;

    let status = response.status();
    let body = response.text().await.map_err(DepotError::from)?;

    if !status.is_success() {
        let parsed: Option<TokenResponse> = serde_json::from_str(&body).ok();
        if let Some(TokenResponse {
            error: Some(error),
            error_description,
            ..
        }) = parsed
        {
            return Err(SessionError::Rejected {
                error,
                description: error_description,
            });
        }
        return Err(SessionError::Handshake(DepotError::Api {
            status: status.as_u16(),
            code: None,
            message: None,
            body: Some(body),
        }));
    }

    let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
        SessionError::Handshake(DepotError::Api {
            status: status.as_u16(),
            code: None,
            message: Some(format!("unparseable token response: {}", e)),
            body: Some(body.clone()),
        })
    })?;

    match parsed.access_token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(SessionError::Rejected {
            error: "invalid_response".to_string(),
            description: Some("token endpoint returned no access_token".to_string()),
        }),
    }
}
