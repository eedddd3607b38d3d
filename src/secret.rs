//! Secret string handling for sensitive values.
//!
//! [`SecretString`] wraps bearer tokens, shared secrets, and client secrets so
//! that they cannot leak through `Debug`/`Display` output or log lines. When a
//! log entry needs to identify a credential, use
//! [`fingerprint()`](SecretString::fingerprint), a short, non-reversible
//! digest, never the raw value.

use std::fmt::{self, Debug, Display, Formatter, Write as _};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// A string wrapper that redacts its contents in Debug and Display output.
///
/// The value is preserved internally but hidden from accidental exposure.
/// Use [`expose()`](SecretString::expose) at the point where the secret is
/// actually consumed (e.g. an `Authorization` header).
#[derive(Clone)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new `SecretString` from any string-like value.
    pub fn new(s: impl Into<String>) -> Self {
        Self { value: s.into() }
    }

    /// Expose the underlying secret value.
    ///
    /// Be careful not to log or display the returned value.
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Consume the wrapper and return the underlying value.
    pub fn into_inner(self) -> String {
        self.value
    }

    /// Returns true if the secret string is empty.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// A short, non-reversible identifier for this secret.
    ///
    /// First eight hex characters of the SHA-256 digest. Safe to log: it
    /// identifies a credential across log lines without revealing it.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.value.as_bytes());
        let mut out = String::with_capacity(8);
        for byte in &digest[..4] {
            // writing to a String cannot fail
            let _ = write!(out, "{:02x}", byte);
        }
        out
    }
}

impl Debug for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Display for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// Serializes/deserializes transparently as a plain string.
impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}
