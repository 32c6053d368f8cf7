//! # Principals
//!
//! A [`Principal`] is the identity the authenticator resolves from a
//! presented token. A [`PrincipalRecord`] is the identity-store row it is
//! resolved against; only the `api_key` column matters to the gate.

use serde::{Deserialize, Serialize};

use crate::token::ApiToken;

/// Identity-store row matched by exact `api_key` equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRecord {
    /// Store-assigned identifier, used in logs instead of the key.
    pub id: i64,
    /// The API key clients present as their token.
    pub api_key: ApiToken,
}

impl PrincipalRecord {
    /// Create a record.
    pub fn new(id: i64, api_key: impl Into<String>) -> Self {
        Self {
            id,
            api_key: ApiToken::new(api_key),
        }
    }
}

/// Identity constructed per request by the authenticator. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// The raw credential presented.
    pub token: ApiToken,
    /// Whether the token resolved against the identity store.
    pub resolved: bool,
    /// Identifier of the matching record, when resolved.
    pub record_id: Option<i64>,
}

impl Principal {
    /// A principal whose token matched `record`.
    pub fn resolved(token: ApiToken, record: &PrincipalRecord) -> Self {
        Self {
            token,
            resolved: true,
            record_id: Some(record.id),
        }
    }
}
