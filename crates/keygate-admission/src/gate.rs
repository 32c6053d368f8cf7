//! # Admission Gate
//!
//! Composes the [`Authenticator`] and the [`FixedWindowLimiter`] into the
//! single decision the HTTP layer needs. Authentication always runs first;
//! the limiter is never consulted for an unauthenticated request.

use std::net::IpAddr;

use keygate_core::{Admission, FailureMode, GateError, KeyKind, Principal, RateLimitKey};

use crate::authenticator::Authenticator;
use crate::exemption::Exemptions;
use crate::limiter::FixedWindowLimiter;

/// Gate behaviour that is independent of the stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// What to do when the counter store fails.
    pub failure_mode: FailureMode,
    /// Routes that bypass authentication.
    pub exemptions: Exemptions,
    /// Charge exempt routes under the client address.
    pub throttle_anonymous_by_ip: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            failure_mode: FailureMode::Closed,
            exemptions: Exemptions::default(),
            throttle_anonymous_by_ip: false,
        }
    }
}

/// The parts of an HTTP request the gate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionRequest<'a> {
    /// Request path, without query string.
    pub route: &'a str,
    /// Raw `Authorization` header value.
    pub authorization: Option<&'a str>,
    /// Peer address, when known.
    pub client_ip: Option<IpAddr>,
}

impl<'a> AdmissionRequest<'a> {
    /// Request for `route` with no credential and no address.
    pub fn new(route: &'a str) -> Self {
        Self {
            route,
            authorization: None,
            client_ip: None,
        }
    }

    /// Attach an `Authorization` header value.
    pub fn with_authorization(mut self, authorization: &'a str) -> Self {
        self.authorization = Some(authorization);
        self
    }

    /// Attach the peer address.
    pub fn with_client_ip(mut self, client_ip: IpAddr) -> Self {
        self.client_ip = Some(client_ip);
        self
    }
}

/// A request the gate let through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionGranted {
    /// The resolved caller; `None` on exempt routes.
    pub principal: Option<Principal>,
    /// The key that was charged, if any.
    pub key: Option<RateLimitKey>,
}

impl AdmissionGranted {
    fn exempt(key: Option<RateLimitKey>) -> Self {
        Self {
            principal: None,
            key,
        }
    }

    /// Whether the request was let through without authentication.
    pub fn is_exempt(&self) -> bool {
        self.principal.is_none()
    }
}

/// Authentication followed by fixed-window rate limiting.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    authenticator: Authenticator,
    limiter: FixedWindowLimiter,
    config: GateConfig,
}

impl AdmissionGate {
    /// Compose a gate.
    pub fn new(authenticator: Authenticator, limiter: FixedWindowLimiter, config: GateConfig) -> Self {
        Self {
            authenticator,
            limiter,
            config,
        }
    }

    /// The gate configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// The rate limiter.
    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }

    /// Decide whether `request` may reach its handler.
    ///
    /// # Errors
    ///
    /// - [`GateError::Unauthenticated`] when the credential is missing or
    ///   unknown.
    /// - [`GateError::RateLimited`] when the key's window budget is spent.
    /// - [`GateError::StoreUnavailable`] when the identity store fails, or
    ///   the counter store fails while failing closed.
    pub async fn admit(&self, request: &AdmissionRequest<'_>) -> Result<AdmissionGranted, GateError> {
        if self.config.exemptions.is_exempt(request.route) {
            return self.admit_exempt(request).await;
        }

        let principal = match self.authenticator.authenticate(request.authorization).await {
            Ok(principal) => principal,
            Err(err) => {
                if let GateError::Unauthenticated(reason) = &err {
                    tracing::warn!(route = request.route, reason = %reason, "authentication failed");
                }
                return Err(err);
            }
        };

        let key = RateLimitKey::for_token(&principal.token);
        self.charge(request.route, &key, Some(&principal)).await?;

        tracing::debug!(
            route = request.route,
            key_kind = key.kind().as_str(),
            token_fp = %principal.token.fingerprint(),
            principal_id = ?principal.record_id,
            "request admitted"
        );
        Ok(AdmissionGranted {
            principal: Some(principal),
            key: Some(key),
        })
    }

    async fn admit_exempt(&self, request: &AdmissionRequest<'_>) -> Result<AdmissionGranted, GateError> {
        if !self.config.throttle_anonymous_by_ip {
            return Ok(AdmissionGranted::exempt(None));
        }
        let Some(addr) = request.client_ip else {
            tracing::debug!(route = request.route, "exempt route without peer address, not throttled");
            return Ok(AdmissionGranted::exempt(None));
        };

        let key = RateLimitKey::for_ip(addr);
        self.charge(request.route, &key, None).await?;
        Ok(AdmissionGranted::exempt(Some(key)))
    }

    /// Run the limiter for `key` and apply the failure mode.
    async fn charge(
        &self,
        route: &str,
        key: &RateLimitKey,
        principal: Option<&Principal>,
    ) -> Result<(), GateError> {
        let token_fp = principal.map(|p| p.token.fingerprint());
        let subject = match key.kind() {
            KeyKind::Token => token_fp.unwrap_or_default(),
            KeyKind::Ip => key.as_str().to_string(),
        };

        match self.limiter.check_and_increment(key).await {
            Ok(Admission::Allow) => Ok(()),
            Ok(Admission::Reject { retry_after }) => {
                tracing::warn!(
                    route,
                    key_kind = key.kind().as_str(),
                    subject = %subject,
                    retry_after_secs = retry_after.map(|d| d.as_secs()),
                    "rate limit exceeded"
                );
                Err(GateError::RateLimited { retry_after })
            }
            Err(err) => match self.config.failure_mode {
                FailureMode::Open => {
                    tracing::warn!(
                        route,
                        key_kind = key.kind().as_str(),
                        error = %err,
                        "counter store failed, admitting (fail-open)"
                    );
                    Ok(())
                }
                FailureMode::Closed => {
                    tracing::error!(
                        route,
                        key_kind = key.kind().as_str(),
                        error = %err,
                        "counter store failed, rejecting (fail-closed)"
                    );
                    Err(GateError::StoreUnavailable(err))
                }
            },
        }
    }
}
