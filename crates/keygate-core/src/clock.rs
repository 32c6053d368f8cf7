//! # Clock
//!
//! Counter stores read time through [`Clock`] so window expiry can be driven
//! deterministically in tests.

use std::fmt::Debug;
use std::time::Instant;

/// Source of monotonic time.
pub trait Clock: Send + Sync + Debug {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
mod mock {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use parking_lot::Mutex;

    use super::Clock;

    /// Controllable clock for tests.
    ///
    /// Clones share the same time value, so advancing one advances all.
    #[derive(Debug, Clone)]
    pub struct MockClock {
        current: Arc<Mutex<Instant>>,
    }

    impl MockClock {
        /// Start at `start`.
        pub fn new(start: Instant) -> Self {
            Self {
                current: Arc::new(Mutex::new(start)),
            }
        }

        /// Move time forward by `by`.
        pub fn advance(&self, by: Duration) {
            *self.current.lock() += by;
        }

        /// Jump to `instant`.
        pub fn set(&self, instant: Instant) {
            *self.current.lock() = instant;
        }
    }

    impl Default for MockClock {
        fn default() -> Self {
            Self::new(Instant::now())
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            *self.current.lock()
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use mock::MockClock;
