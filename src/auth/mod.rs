//! Authentication: the request gate, the startup session, and client
//! resolution.
//!
//! Three mutually exclusive strategies, fixed at process start:
//!
//! - **OAuth / CCG**: [`session`] performs one handshake at startup and the
//!   resulting process-lifetime client serves every request. The HTTP
//!   [`gate`] checks callers against a shared secret.
//! - **Delegated**: no startup session. The [`gate`] extracts the caller's
//!   bearer token per request, and [`resolver`] derives a request-scoped
//!   client from it.

pub mod gate;
pub mod resolver;
pub mod session;

pub use gate::{AuthGateLayer, AuthGateService, GatePolicy};
pub use resolver::{ClientResolver, ClientUnavailable};
pub use session::{Session, SessionError};
