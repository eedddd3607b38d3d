//! Per-request client resolution.
//!
//! Resolution order: the process-lifetime client when one exists (OAuth/CCG
//! modes), otherwise a client derived from the request's delegated token,
//! otherwise failure. Derived clients are request-scoped and never cached.

use crate::config::DepotConfig;
use crate::context::RequestAuth;
use crate::depot::DepotClient;

/// No resolution path produced a usable client.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ClientUnavailable(String);

impl ClientUnavailable {
    pub(crate) fn delegated_token_missing() -> Self {
        Self(
            "Depot client is not initialized. In delegated mode, ensure the request \
             carries an Authorization bearer token."
                .to_string(),
        )
    }
}

/// Resolves the authenticated Depot client for a request.
///
/// Cheap to clone; shared by every request of the process. The inner HTTP
/// connector is reused by derived clients so per-request construction does no
/// I/O of its own.
#[derive(Clone)]
pub struct ClientResolver {
    process: Option<DepotClient>,
    http: reqwest::Client,
    depot: DepotConfig,
}

impl std::fmt::Debug for ClientResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientResolver")
            .field("process_client", &self.process.is_some())
            .finish()
    }
}

impl ClientResolver {
    pub fn new(
        process: Option<DepotClient>,
        http: reqwest::Client,
        depot: DepotConfig,
    ) -> Self {
        Self {
            process,
            http,
            depot,
        }
    }

    /// Whether a process-lifetime client is held (OAuth/CCG modes).
    pub fn has_process_client(&self) -> bool {
        self.process.is_some()
    }

    /// Resolve the client for the request described by `auth`.
    ///
    /// Never blocks on network I/O; derived clients reuse the shared
    /// connector and only bind the token.
    pub fn resolve(&self, auth: &RequestAuth) -> Result<DepotClient, ClientUnavailable> {
        if let Some(client) = &self.process {
            return Ok(client.clone());
        }

        if let Some(token) = auth.token() {
            tracing::debug!(
                token = %token.fingerprint(),
                "deriving request-scoped client from delegated token"
            );
            return Ok(DepotClient::with_token(
                self.http.clone(),
                &self.depot,
                token.clone(),
            ));
        }

        Err(ClientUnavailable::delegated_token_missing())
    }
}
