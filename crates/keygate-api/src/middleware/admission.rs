//! # Admission Middleware
//!
//! Runs the [`AdmissionGate`](keygate_admission::AdmissionGate) before any
//! gated handler. On success the resolved principal is stored in request
//! extensions for the [`Caller`] extractor; on failure the gate's error is
//! rendered and the handler never runs.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use keygate_admission::AdmissionRequest;
use keygate_core::GateError;

use crate::error::AppError;
use crate::extractors::Caller;
use crate::middleware::metrics::record_admission;
use crate::state::AppState;

/// Authenticate and rate-limit the request.
///
/// The client address comes from `ConnectInfo`, present when the server is
/// started with `into_make_service_with_connect_info::<SocketAddr>()`.
pub async fn admission_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let route = request.uri().path().to_string();
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let mut admission = AdmissionRequest::new(&route);
    if let Some(value) = authorization.as_deref() {
        admission = admission.with_authorization(value);
    }
    if let Some(ip) = client_ip {
        admission = admission.with_client_ip(ip);
    }

    match state.gate.admit(&admission).await {
        Ok(granted) => {
            record_admission(if granted.is_exempt() { "exempt" } else { "allowed" });
            if let Some(principal) = granted.principal {
                request.extensions_mut().insert(Caller(principal));
            }
            next.run(request).await
        }
        Err(err) => {
            record_admission(outcome(&err));
            AppError::from_gate(err, &state.settings.auth.realm).into_response()
        }
    }
}

fn outcome(err: &GateError) -> &'static str {
    match err {
        GateError::Unauthenticated(_) => "unauthenticated",
        GateError::RateLimited { .. } => "rate_limited",
        GateError::StoreUnavailable(_) => "store_unavailable",
    }
}
