//! # keygate-api: Axum Host for the Admission Gate
//!
//! Mounts the admission gate in front of the API routes and exposes health
//! probes and Prometheus metrics outside it.
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AdmissionMiddleware → Handler
//! ```
//!
//! The admission middleware wraps the gated router's fallback too, so an
//! unknown path is authenticated and charged before it is answered with 404.

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::AppState;

use axum::extract::Request;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let gated = routes::gated().fallback(not_found).layer(from_fn_with_state(
        state.clone(),
        middleware::admission::admission_middleware,
    ));

    let open = routes::health::router().route("/metrics", get(middleware::metrics::render));

    Router::new()
        .merge(open)
        .merge(gated)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}

async fn not_found(request: Request) -> AppError {
    AppError::NotFound(request.uri().path().to_string())
}
