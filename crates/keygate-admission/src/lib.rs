//! # keygate-admission: Authentication and Rate Limiting
//!
//! Request flow through [`AdmissionGate::admit`]:
//!
//! ```text
//! route exempt? ── yes ──> (optional IP throttle) ──> granted
//!      │
//!      no
//!      ▼
//! Authenticator ── Missing / InvalidCredential ──> 401
//!      │
//!      ▼
//! FixedWindowLimiter ── Reject ──> 429
//!      │             └─ store failure ──> 503 (closed) / granted (open)
//!      ▼
//!   granted
//! ```
//!
//! Store calls run on their own task and are awaited with a timeout, so a
//! caller dropping its future never aborts a counter mutation halfway.

pub mod authenticator;
pub mod exemption;
pub mod gate;
pub mod limiter;

mod bounded;

pub use authenticator::Authenticator;
pub use exemption::{Exemptions, PatternError, RoutePattern};
pub use gate::{AdmissionGate, AdmissionGranted, AdmissionRequest, GateConfig};
pub use limiter::FixedWindowLimiter;

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(2);
