//! # Prometheus Metrics
//!
//! Request and admission counters recorded through the `metrics` facade.
//! Without an installed recorder every call is a no-op, so tests and
//! embedders that skip [`install_recorder`] pay nothing.
//!
//! | Metric                         | Labels            |
//! |--------------------------------|-------------------|
//! | `keygate_http_requests_total`  | `method`, `status`|
//! | `keygate_admissions_total`     | `outcome`         |

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::error::AppError;
use crate::state::AppState;

/// Install the global Prometheus recorder.
///
/// Fails if another recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Count one admission decision.
pub fn record_admission(outcome: &'static str) {
    metrics::counter!("keygate_admissions_total", "outcome" => outcome).increment(1);
}

/// Middleware that counts requests by method and status.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_owned();
    let response = next.run(request).await;
    metrics::counter!(
        "keygate_http_requests_total",
        "method" => method,
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    response
}

/// `GET /metrics`: Prometheus text exposition.
pub async fn render(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => AppError::NotFound("/metrics".to_string()).into_response(),
    }
}
