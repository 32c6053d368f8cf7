//! # Request Extractors

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use keygate_core::Principal;

use crate::config::DEFAULT_REALM;
use crate::error::AppError;

/// The principal the admission middleware resolved for this request.
///
/// Rejects with 401 when absent, which happens only on exempt routes or when
/// a handler is mounted outside the gate.
#[derive(Debug, Clone)]
pub struct Caller(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized {
                realm: DEFAULT_REALM.to_string(),
            })
    }
}
