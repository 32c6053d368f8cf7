//! # keygate-store: Store Ports and Adapters
//!
//! The admission gate talks to two external stores through the ports defined
//! here:
//!
//! - [`CounterStore`] holds fixed-window counters keyed by rate-limit key.
//! - [`IdentityStore`] resolves presented tokens to principal records.
//!
//! ## Adapters
//!
//! | Port            | Adapter                | Feature    |
//! |-----------------|------------------------|------------|
//! | `CounterStore`  | [`MemoryCounterStore`] | always     |
//! | `CounterStore`  | `RedisCounterStore`    | `redis`    |
//! | `IdentityStore` | [`MemoryIdentityStore`]| always     |
//! | `IdentityStore` | `PgIdentityStore`      | `postgres` |
//!
//! Every adapter performs the fixed-window step of
//! [`WindowPolicy::step`](keygate_core::WindowPolicy::step) inside a single
//! atomic section, so concurrent callers on the same key never lose updates.

pub mod counter;
pub mod identity;
pub mod memory;

#[cfg(feature = "postgres")]
pub mod pg_identity;
#[cfg(feature = "redis")]
pub mod redis_counter;

pub use counter::{CounterStore, DEFAULT_KEY_PREFIX};
pub use identity::{IdentityStore, MemoryIdentityStore};
pub use memory::MemoryCounterStore;

#[cfg(feature = "postgres")]
pub use pg_identity::PgIdentityStore;
#[cfg(feature = "redis")]
pub use redis_counter::RedisCounterStore;
