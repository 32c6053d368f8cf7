//! # Token Authenticator
//!
//! Extracts the token from the `Authorization` header and resolves it
//! against the identity store. Lookups are read-only.

use std::sync::Arc;
use std::time::Duration;

use keygate_core::{AuthError, Credential, GateError, Principal};
use keygate_store::IdentityStore;

use crate::bounded::bounded;

/// Resolves presented tokens to principals.
#[derive(Debug, Clone)]
pub struct Authenticator {
    identities: Arc<dyn IdentityStore>,
    timeout: Duration,
}

impl Authenticator {
    /// Authenticator over `identities`, bounding each lookup by `timeout`.
    pub fn new(identities: Arc<dyn IdentityStore>, timeout: Duration) -> Self {
        Self {
            identities,
            timeout,
        }
    }

    /// Resolve the credential in `authorization`.
    ///
    /// # Errors
    ///
    /// - [`GateError::Unauthenticated`] with [`AuthError::Missing`] when the
    ///   header is absent or unparseable.
    /// - [`GateError::Unauthenticated`] with [`AuthError::InvalidCredential`]
    ///   when no record matches the token.
    /// - [`GateError::StoreUnavailable`] when the identity store fails or
    ///   times out.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, GateError> {
        let token = Credential::from_header(authorization)?.into_token();

        let identities = Arc::clone(&self.identities);
        let lookup = token.clone();
        let record = bounded(self.timeout, async move {
            identities.find_by_api_key(&lookup).await
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, token_fp = %token.fingerprint(), "identity lookup failed");
            e
        })?;

        match record {
            Some(record) => Ok(Principal::resolved(token, &record)),
            None => Err(AuthError::InvalidCredential.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_core::PrincipalRecord;
    use keygate_store::MemoryIdentityStore;

    fn authenticator() -> Authenticator {
        let store = MemoryIdentityStore::new([PrincipalRecord::new(42, "abc123")]);
        Authenticator::new(Arc::new(store), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn known_token_resolves() {
        let principal = authenticator()
            .authenticate(Some(r#"Token token="abc123""#))
            .await
            .unwrap();
        assert!(principal.resolved);
        assert_eq!(principal.record_id, Some(42));
        assert_eq!(principal.token.expose(), "abc123");
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let err = authenticator()
            .authenticate(Some("Bearer nope"))
            .await
            .unwrap_err();
        assert_eq!(err, GateError::Unauthenticated(AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn missing_header_is_missing() {
        let err = authenticator().authenticate(None).await.unwrap_err();
        assert_eq!(err, GateError::Unauthenticated(AuthError::Missing));
    }

    #[tokio::test]
    async fn foreign_scheme_is_missing() {
        let err = authenticator()
            .authenticate(Some("Basic YWJjMTIzOg=="))
            .await
            .unwrap_err();
        assert_eq!(err, GateError::Unauthenticated(AuthError::Missing));
    }
}
