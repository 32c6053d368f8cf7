//! # Identity Store Port
//!
//! Resolves a presented token to the principal record whose `api_key`
//! matches it exactly. Nothing else of the user entity is modelled.

use std::fmt::{self, Debug};

use async_trait::async_trait;
use keygate_core::{ApiToken, PrincipalRecord, StoreError};
use subtle::ConstantTimeEq;

/// Lookup of principal records by API key.
#[async_trait]
pub trait IdentityStore: Send + Sync + Debug {
    /// The record whose `api_key` equals `token`, if any.
    async fn find_by_api_key(
        &self,
        token: &ApiToken,
    ) -> Result<Option<PrincipalRecord>, StoreError>;

    /// Health probe.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Identity store seeded from configuration.
///
/// Every lookup compares against every record in constant time per record.
#[derive(Clone, Default)]
pub struct MemoryIdentityStore {
    records: Vec<PrincipalRecord>,
}

impl MemoryIdentityStore {
    /// Store holding `records`.
    pub fn new(records: impl IntoIterator<Item = PrincipalRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    /// Number of seeded records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are seeded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// Records hold raw API keys; print ids only.
impl Debug for MemoryIdentityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<i64> = self.records.iter().map(|r| r.id).collect();
        f.debug_struct("MemoryIdentityStore")
            .field("record_ids", &ids)
            .finish()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_api_key(
        &self,
        token: &ApiToken,
    ) -> Result<Option<PrincipalRecord>, StoreError> {
        // No early exit, so lookup time does not depend on match position.
        let found = self.records.iter().fold(None, |found, record| {
            if constant_time_token_eq(token.expose(), record.api_key.expose()) {
                Some(record)
            } else {
                found
            }
        });
        Ok(found.cloned())
    }
}

/// Constant-time comparison of API keys.
///
/// When lengths differ a dummy comparison keeps timing independent of the
/// length mismatch.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryIdentityStore {
        MemoryIdentityStore::new([
            PrincipalRecord::new(1, "abc123"),
            PrincipalRecord::new(2, "def456"),
        ])
    }

    #[tokio::test]
    async fn finds_exact_match() {
        let found = store()
            .find_by_api_key(&ApiToken::new("def456"))
            .await
            .unwrap();
        assert_eq!(found, Some(PrincipalRecord::new(2, "def456")));
    }

    #[tokio::test]
    async fn prefix_and_case_variants_do_not_match() {
        let store = store();
        for candidate in ["abc", "abc1234", "ABC123", ""] {
            let found = store
                .find_by_api_key(&ApiToken::new(candidate))
                .await
                .unwrap();
            assert_eq!(found, None, "{candidate:?} must not resolve");
        }
    }

    #[test]
    fn debug_omits_api_keys() {
        let printed = format!("{:?}", store());
        assert!(!printed.contains("abc123"));
        assert!(printed.contains("record_ids"));
    }

    #[test]
    fn constant_time_eq_handles_lengths() {
        assert!(constant_time_token_eq("same", "same"));
        assert!(!constant_time_token_eq("same", "sam"));
        assert!(!constant_time_token_eq("same", "samf"));
    }
}
