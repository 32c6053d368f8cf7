//! # Error Hierarchy
//!
//! Structured error types for the admission gate, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! The HTTP layer maps these onto status codes:
//!
//! | Error                          | Status |
//! |--------------------------------|--------|
//! | [`GateError::Unauthenticated`] | 401    |
//! | [`GateError::RateLimited`]     | 429    |
//! | [`GateError::StoreUnavailable`]| 503    |

use std::time::Duration;

use thiserror::Error;

/// Authentication failures. Both variants surface as 401.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No credential was presented, or the `Authorization` header could not
    /// be parsed as a `Token`/`Bearer` credential.
    #[error("missing credential")]
    Missing,

    /// A credential was presented but does not resolve to a principal.
    #[error("invalid credential")]
    InvalidCredential,
}

/// Failures of an external store (identity or counter).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or returned an error.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer within the configured timeout.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    /// A stored value could not be interpreted. The key is omitted because
    /// token keys embed the raw credential.
    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}

/// Terminal outcome of a rejected admission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The authenticator rejected the request.
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] AuthError),

    /// The window budget for the request's key is exhausted.
    #[error("rate limited")]
    RateLimited {
        /// Time until the current window expires, when the store reports it.
        retry_after: Option<Duration>,
    },

    /// A store failed and the gate is configured to fail closed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}
