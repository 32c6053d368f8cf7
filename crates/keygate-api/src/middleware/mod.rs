//! # Middleware Modules
//!
//! Tower middleware layers for the API service.

pub mod admission;
pub mod metrics;
pub mod tracing_layer;
