//! Per-request context for tool handlers.
//!
//! [`RequestAuth`] is the request-scoped credential slot. Isolation is
//! structural: the value is owned by exactly one in-flight request. It rides
//! the HTTP request's extensions into the dispatch request and then into this
//! context, and is dropped with the request on every exit path (success,
//! failure, cancellation). There is no shared cell for concurrent requests to
//! race on.

use crate::auth::resolver::ClientResolver;
use crate::depot::DepotClient;
use crate::error::Result;
use crate::protocol::RequestId;
use crate::secret::SecretString;

/// Bearer token extracted by the delegated auth gate, carried through the
/// HTTP request's extensions.
#[derive(Debug, Clone)]
pub struct DelegatedToken(pub SecretString);

/// The resolved credential state of one request.
///
/// Populated only in delegated mode; in OAuth/CCG modes the slot stays empty
/// and the process-lifetime client is used instead. Exactly one of the two is
/// ever available for a given request.
#[derive(Debug, Clone, Default)]
pub struct RequestAuth {
    token: Option<SecretString>,
}

impl RequestAuth {
    /// An empty slot (OAuth/CCG modes, and stdio where no gate runs).
    pub fn none() -> Self {
        Self { token: None }
    }

    /// A slot holding the caller's delegated bearer token.
    pub fn delegated(token: SecretString) -> Self {
        Self { token: Some(token) }
    }

    pub fn from_delegated(token: Option<DelegatedToken>) -> Self {
        Self {
            token: token.map(|t| t.0),
        }
    }

    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }
}

/// Context handed to a tool handler for the duration of one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    auth: RequestAuth,
    resolver: ClientResolver,
}

impl RequestContext {
    pub fn new(request_id: RequestId, auth: RequestAuth, resolver: ClientResolver) -> Self {
        Self {
            request_id,
            auth,
            resolver,
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn auth(&self) -> &RequestAuth {
        &self.auth
    }

    /// The authenticated Depot client for this request.
    ///
    /// Idempotent within a request: repeated calls yield an equivalent client
    /// bound to the same credential. Fails with `ClientUnavailable` when
    /// neither a process-lifetime client nor a delegated token exists.
    pub fn client(&self) -> Result<DepotClient> {
        Ok(self.resolver.resolve(&self.auth)?)
    }
}
