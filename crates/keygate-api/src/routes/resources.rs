//! Placeholder resource indexes.
//!
//! The gate protects these paths; the resources themselves live elsewhere,
//! so each index answers with an empty list once the caller is admitted.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use crate::extractors::Caller;
use crate::state::AppState;

/// Paths served by [`index`].
pub const PATHS: [&str; 4] = [
    "/v1/users",
    "/v1/products",
    "/v1/my_users/users",
    "/v1/my_users/pets",
];

pub fn router() -> Router<AppState> {
    PATHS
        .into_iter()
        .fold(Router::new(), |router, path| router.route(path, get(index)))
}

async fn index(Caller(principal): Caller) -> Json<Vec<Value>> {
    tracing::debug!(principal_id = ?principal.record_id, "listing placeholder resources");
    Json(Vec::new())
}
