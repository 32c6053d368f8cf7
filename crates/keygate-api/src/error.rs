//! # API Error Types
//!
//! [`AppError`] implements `IntoResponse`. Every error body has the shape
//! `{"message": "..."}`; store failures and internal errors are logged and
//! answered with a generic message.

use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use keygate_core::GateError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DEFAULT_REALM;

/// Body of a 401.
pub const BAD_CREDENTIALS: &str = "Bad credentials";

/// Body of a 429.
pub const TOO_MANY_REQUESTS: &str =
    "You have fired too many requests. Please wait for some time.";

/// Body of a 503.
pub const SERVICE_UNAVAILABLE: &str = "Service temporarily unavailable";

/// JSON error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Application-level error with an HTTP mapping.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or unknown credential (401).
    #[error("unauthorized")]
    Unauthorized {
        /// Realm advertised in `WWW-Authenticate`.
        realm: String,
    },

    /// Window budget exhausted (429).
    #[error("rate limited")]
    RateLimited {
        /// Remaining window time, sent as `Retry-After` when known.
        retry_after: Option<Duration>,
    },

    /// A store failed while the gate fails closed (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// No route matched (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal server error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Map a gate rejection, advertising `realm` on a 401.
    pub fn from_gate(err: GateError, realm: &str) -> Self {
        match err {
            GateError::Unauthenticated(_) => Self::Unauthorized {
                realm: realm.to_string(),
            },
            GateError::RateLimited { retry_after } => Self::RateLimited { retry_after },
            GateError::StoreUnavailable(store) => Self::ServiceUnavailable(store.to_string()),
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Unauthorized { .. } => BAD_CREDENTIALS.to_string(),
            Self::RateLimited { .. } => TOO_MANY_REQUESTS.to_string(),
            Self::ServiceUnavailable(_) => SERVICE_UNAVAILABLE.to_string(),
            Self::NotFound(path) => format!("No route matches {path}"),
            Self::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        Self::from_gate(err, DEFAULT_REALM)
    }
}

/// `Token realm="<realm>"` with any double quotes in the realm removed.
fn challenge(realm: &str) -> HeaderValue {
    let value = format!("Token realm=\"{}\"", realm.replace('"', ""));
    HeaderValue::from_str(&value)
        .unwrap_or_else(|_| HeaderValue::from_static("Token realm=\"Application\""))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            tracing::error!(error = %detail, "internal server error");
        }

        let status = self.status();
        let body = Json(ErrorBody {
            message: self.message(),
        });
        let mut response = (status, body).into_response();

        match &self {
            Self::Unauthorized { realm } => {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, challenge(realm));
            }
            Self::RateLimited {
                retry_after: Some(after),
            } => {
                // Round up so clients never retry inside the window.
                let secs = after.as_secs() + u64::from(after.subsec_nanos() > 0);
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
            }
            _ => {}
        }
        response
    }
}
