//! # Counter Store Port
//!
//! Keys passed to a [`CounterStore`] are rate-limit keys such as
//! `token:abc123`. Each adapter namespaces them with its own prefix
//! (default [`DEFAULT_KEY_PREFIX`]) before they reach the backend.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use keygate_core::{StoreError, WindowHit, WindowPolicy};

/// Namespace prepended to every counter key.
///
/// Stored keys read `count:token:<t>` or `count:ip:<addr>`. The kind segment
/// keeps token and address windows apart, so these keys do not collide with
/// bare `count:<t>` counters written by other deployments.
pub const DEFAULT_KEY_PREFIX: &str = "count:";

/// Shared, expiring integer counters.
#[async_trait]
pub trait CounterStore: Send + Sync + Debug {
    /// Current value of a live counter, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError>;

    /// Overwrite a counter and give it a fresh expiry.
    async fn set_with_expiry(&self, key: &str, value: u64, ttl: Duration)
        -> Result<(), StoreError>;

    /// Increment by one and return the new value.
    ///
    /// An absent counter is created at 1 with no expiry. An existing expiry
    /// is left untouched.
    async fn increment(&self, key: &str) -> Result<u64, StoreError>;

    /// Remaining lifetime of a counter. `None` when the counter is absent or
    /// has no expiry.
    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, StoreError>;

    /// One atomic fixed-window step for `key` under `policy`.
    async fn hit(&self, key: &str, policy: &WindowPolicy) -> Result<WindowHit, StoreError>;

    /// Health probe.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
