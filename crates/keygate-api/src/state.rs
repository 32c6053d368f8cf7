//! # Application State
//!
//! Shared handles cloned into every handler and middleware invocation.

use std::sync::Arc;

use keygate_admission::{AdmissionGate, Authenticator, FixedWindowLimiter};
use keygate_store::{CounterStore, IdentityStore, MemoryCounterStore, MemoryIdentityStore};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::{Settings, SettingsError};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The admission gate.
    pub gate: Arc<AdmissionGate>,
    /// Counter store, probed by readiness.
    pub counters: Arc<dyn CounterStore>,
    /// Identity store, probed by readiness.
    pub identities: Arc<dyn IdentityStore>,
    /// Effective settings.
    pub settings: Arc<Settings>,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Assemble the gate over the given stores.
    pub fn new(
        settings: Settings,
        identities: Arc<dyn IdentityStore>,
        counters: Arc<dyn CounterStore>,
    ) -> Result<Self, SettingsError> {
        let timeout = settings.store_timeout();
        let policy = settings.window_policy()?;
        let gate = AdmissionGate::new(
            Authenticator::new(Arc::clone(&identities), timeout),
            FixedWindowLimiter::new(Arc::clone(&counters), policy, timeout),
            settings.gate_config(),
        );
        Ok(Self {
            gate: Arc::new(gate),
            counters,
            identities,
            settings: Arc::new(settings),
            metrics: None,
        })
    }

    /// In-memory stores, with principals seeded from `settings`.
    pub fn in_memory(settings: Settings) -> Result<Self, SettingsError> {
        let identities = Arc::new(MemoryIdentityStore::new(settings.principals.clone()));
        let counters = Arc::new(
            MemoryCounterStore::new().with_prefix(settings.throttle.key_prefix.clone()),
        );
        Self::new(settings, identities, counters)
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("gate", &self.gate)
            .field("counters", &self.counters.backend())
            .field("settings", &self.settings)
            .field("metrics", &self.metrics.as_ref().map(|_| "[installed]"))
            .finish_non_exhaustive()
    }
}
