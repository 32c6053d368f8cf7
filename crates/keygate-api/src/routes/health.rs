//! Health probes, mounted outside the admission gate.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
}

/// Liveness probe: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 when both stores answer within the store timeout.
async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    let timeout = state.settings.store_timeout();
    let counters = tokio::time::timeout(timeout, state.counters.ping()).await;
    let identities = tokio::time::timeout(timeout, state.identities.ping()).await;

    match (counters, identities) {
        (Ok(Ok(())), Ok(Ok(()))) => (StatusCode::OK, "ready"),
        (counters, identities) => {
            tracing::warn!(
                counter_store = state.counters.backend(),
                counters_ok = matches!(counters, Ok(Ok(()))),
                identities_ok = matches!(identities, Ok(Ok(()))),
                "readiness check failed"
            );
            (StatusCode::SERVICE_UNAVAILABLE, "not ready")
        }
    }
}
