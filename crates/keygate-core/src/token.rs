//! # API Tokens
//!
//! [`ApiToken`] wraps the raw credential a client presents. The raw value is
//! only reachable through [`ApiToken::expose`]; `Debug` prints a redaction
//! marker and logs use [`ApiToken::fingerprint`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hex characters kept in a token fingerprint.
const FINGERPRINT_LEN: usize = 12;

/// A raw API token as presented in the `Authorization` header.
///
/// Custom `Debug` redacts the value to prevent credential leakage in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    /// Wrap a raw token value.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Access the raw token value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Short, stable SHA-256 fingerprint of the token for log correlation.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        let mut hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        hex.truncate(FINGERPRINT_LEN);
        hex
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiToken").field(&"[REDACTED]").finish()
    }
}

impl From<&str> for ApiToken {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
