#![deny(missing_docs)]

//! # keygate-core: Foundational Types for the Admission Gate
//!
//! This crate defines the types every other keygate crate depends on. It has
//! no internal crate dependencies and performs no I/O.
//!
//! ## Design Principles
//!
//! 1. **Credentials never leak.** [`ApiToken`] redacts itself in `Debug` and
//!    exposes a short SHA-256 [`ApiToken::fingerprint`] for log correlation.
//!
//! 2. **One fixed-window step function.** [`WindowPolicy::step`] is the only
//!    place the create / increment / reject decision is made. Every counter
//!    store adapter applies it inside its own atomic section.
//!
//! 3. **Structured errors.** [`AuthError`], [`StoreError`] and [`GateError`]
//!    are `thiserror` enums. The HTTP mapping lives in `keygate-api`.

pub mod clock;
pub mod credential;
pub mod error;
pub mod key;
pub mod principal;
pub mod token;
pub mod window;

// Re-export primary types at crate root for ergonomic imports.
pub use clock::{Clock, SystemClock};
pub use credential::Credential;
pub use error::{AuthError, GateError, StoreError};
pub use key::{KeyKind, RateLimitKey};
pub use principal::{Principal, PrincipalRecord};
pub use token::ApiToken;
pub use window::{
    Admission, FailureMode, PolicyError, WindowHit, WindowPolicy, WindowStep,
    DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_SECS,
};

#[cfg(any(test, feature = "test-helpers"))]
pub use clock::MockClock;
