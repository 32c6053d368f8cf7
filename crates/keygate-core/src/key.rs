//! # Rate-Limit Keys
//!
//! A [`RateLimitKey`] names the entity a counter belongs to: either a token
//! (`token:<value>`) or a client address (`ip:<addr>`). Keys are derived
//! deterministically per request and are never empty.

use std::net::IpAddr;

use crate::token::ApiToken;

/// What a key throttles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// Keyed by the presented API token.
    Token,
    /// Keyed by the client address (fallback identity).
    Ip,
}

impl KeyKind {
    /// The key prefix for this kind, without the separator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Ip => "ip",
        }
    }
}

/// Identifier of a window counter.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    kind: KeyKind,
    value: String,
}

impl RateLimitKey {
    /// Key for an authenticated token.
    pub fn for_token(token: &ApiToken) -> Self {
        Self {
            kind: KeyKind::Token,
            value: format!("{}:{}", KeyKind::Token.as_str(), token.expose()),
        }
    }

    /// Key for a client address.
    pub fn for_ip(addr: IpAddr) -> Self {
        Self {
            kind: KeyKind::Ip,
            value: format!("{}:{addr}", KeyKind::Ip.as_str()),
        }
    }

    /// What the key throttles.
    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// The full key, e.g. `token:abc123`.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The key as stored, with the store's namespace prefix applied.
    pub fn with_prefix(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.value)
    }
}

// Token keys embed the raw credential, so Debug shows only the kind.
impl std::fmt::Debug for RateLimitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            KeyKind::Token => f.write_str("RateLimitKey(token:[REDACTED])"),
            KeyKind::Ip => write!(f, "RateLimitKey({})", self.value),
        }
    }
}
