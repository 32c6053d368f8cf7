//! # Fixed-Window Rate Limiter
//!
//! One counter per [`RateLimitKey`], created at zero on the first request of
//! a window and incremented on every later admitted request. The counter
//! store performs the whole step atomically; the limiter only bounds the
//! call and maps the outcome.

use std::sync::Arc;
use std::time::Duration;

use keygate_core::{Admission, RateLimitKey, StoreError, WindowHit, WindowPolicy};
use keygate_store::CounterStore;

use crate::bounded::bounded;

/// Fixed-window limiter over a shared counter store.
#[derive(Debug, Clone)]
pub struct FixedWindowLimiter {
    store: Arc<dyn CounterStore>,
    policy: WindowPolicy,
    timeout: Duration,
}

impl FixedWindowLimiter {
    /// Limiter applying `policy` to counters in `store`.
    pub fn new(store: Arc<dyn CounterStore>, policy: WindowPolicy, timeout: Duration) -> Self {
        Self {
            store,
            policy,
            timeout,
        }
    }

    /// The window policy in force.
    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    /// The counter store in use.
    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }

    /// Admit or reject one request for `key`, charging it when admitted.
    ///
    /// # Errors
    /// Returns the store failure unchanged; the caller applies its failure
    /// mode.
    pub async fn check_and_increment(&self, key: &RateLimitKey) -> Result<Admission, StoreError> {
        self.hit(key).await.map(|hit| hit.admission())
    }

    /// Like [`check_and_increment`](Self::check_and_increment), returning the
    /// raw store outcome.
    pub async fn hit(&self, key: &RateLimitKey) -> Result<WindowHit, StoreError> {
        let store = Arc::clone(&self.store);
        let policy = self.policy;
        let key = key.as_str().to_string();
        bounded(self.timeout, async move { store.hit(&key, &policy).await }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_core::ApiToken;
    use keygate_store::MemoryCounterStore;

    #[tokio::test]
    async fn first_request_is_allowed_and_uncounted() {
        let store = Arc::new(MemoryCounterStore::new());
        let limiter =
            FixedWindowLimiter::new(store.clone(), WindowPolicy::default(), Duration::from_secs(1));
        let key = RateLimitKey::for_token(&ApiToken::new("t"));

        assert_eq!(limiter.check_and_increment(&key).await, Ok(Admission::Allow));
        assert_eq!(store.get("token:t").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn rejects_once_budget_is_spent() {
        let store = Arc::new(MemoryCounterStore::new());
        let policy = WindowPolicy::new(Duration::from_secs(60), 1).unwrap();
        let limiter = FixedWindowLimiter::new(store, policy, Duration::from_secs(1));
        let key = RateLimitKey::for_token(&ApiToken::new("t"));

        assert!(limiter.check_and_increment(&key).await.unwrap().is_allowed());
        assert!(limiter.check_and_increment(&key).await.unwrap().is_allowed());
        assert!(matches!(
            limiter.check_and_increment(&key).await.unwrap(),
            Admission::Reject { .. }
        ));
    }
}
