//! # Fixed-Window Policy
//!
//! A window counter is created at `0` with an expiry of `now + window` and is
//! incremented by one on every later admitted request until it reaches
//! `max_requests`. The expiry is never extended; once it passes, the key is
//! gone and the next request starts a new window.
//!
//! The first request of a window is admitted without being counted, so a
//! window of `max_requests = 60` admits 61 requests. This matches the
//! deployed behaviour clients already depend on.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default window length: 15 minutes.
pub const DEFAULT_WINDOW_SECS: u64 = 15 * 60;

/// Default number of counted requests per window.
pub const DEFAULT_MAX_REQUESTS: u64 = 60;

/// Invalid window policy parameters.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    /// Windows shorter than one second cannot be expressed as a store TTL.
    #[error("window must be at least one second, got {0:?}")]
    WindowTooShort(Duration),

    /// A budget of zero would reject every request after the first.
    #[error("max_requests must be at least 1")]
    ZeroMaxRequests,
}

/// Window length and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    window: Duration,
    max_requests: u64,
}

/// Decision for one request given the counter's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStep {
    /// No live counter: create it at zero with a fresh expiry, then admit.
    Create,
    /// Budget left: increment by one, then admit.
    Increment,
    /// Budget exhausted: reject without touching the counter.
    Reject,
}

impl WindowPolicy {
    /// Build a policy, validating its parameters.
    pub fn new(window: Duration, max_requests: u64) -> Result<Self, PolicyError> {
        if window.as_secs() == 0 {
            return Err(PolicyError::WindowTooShort(window));
        }
        if max_requests == 0 {
            return Err(PolicyError::ZeroMaxRequests);
        }
        Ok(Self {
            window,
            max_requests,
        })
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Window length in whole seconds, as used for store TTLs.
    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }

    /// Counted requests allowed per window.
    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }

    /// The fixed-window decision for a counter currently at `current`
    /// (`None` when the key is absent or expired).
    pub fn step(&self, current: Option<u64>) -> WindowStep {
        match current {
            None => WindowStep::Create,
            Some(count) if count >= self.max_requests => WindowStep::Reject,
            Some(_) => WindowStep::Increment,
        }
    }
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }
}

/// What a counter store did for one atomic fixed-window step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowHit {
    /// A new window was opened with the counter at zero.
    Created {
        /// Expiry of the new window.
        ttl: Duration,
    },
    /// The counter was incremented.
    Counted {
        /// Counter value after the increment.
        count: u64,
        /// Remaining window time, when known.
        ttl: Option<Duration>,
    },
    /// The budget was exhausted; nothing was mutated.
    Exhausted {
        /// Current counter value.
        count: u64,
        /// Remaining window time, when known.
        retry_after: Option<Duration>,
    },
}

impl WindowHit {
    /// Collapse the store outcome into the admission decision.
    pub fn admission(&self) -> Admission {
        match *self {
            Self::Created { .. } | Self::Counted { .. } => Admission::Allow,
            Self::Exhausted { retry_after, .. } => Admission::Reject { retry_after },
        }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request may proceed.
    Allow,
    /// The request must be turned away.
    Reject {
        /// Time until the window expires, when known.
        retry_after: Option<Duration>,
    },
}

impl Admission {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Behaviour when the counter store cannot answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Admit the request and log the failure.
    Open,
    /// Reject the request with a service-unavailable error.
    #[default]
    Closed,
}

impl FailureMode {
    /// Lowercase name, as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for FailureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown failure mode: {other} (expected open|closed)")),
        }
    }
}
