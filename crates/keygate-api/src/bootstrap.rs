//! # Store Bootstrap
//!
//! Chooses store adapters from [`Settings`] at startup:
//!
//! | Setting                | Counter store         | Identity store         |
//! |------------------------|-----------------------|------------------------|
//! | `stores.redis` set     | `RedisCounterStore`   |                        |
//! | `stores.redis` unset   | `MemoryCounterStore`  |                        |
//! | `database_url` set     |                       | `PgIdentityStore`      |
//! | `database_url` unset   |                       | `MemoryIdentityStore`  |
//!
//! The in-memory counter store gets a background sweeper that drops expired
//! windows.

use std::sync::Arc;
use std::time::Duration;

use keygate_core::StoreError;
use keygate_store::{
    CounterStore, IdentityStore, MemoryCounterStore, MemoryIdentityStore, PgIdentityStore,
    RedisCounterStore,
};

use crate::config::{Settings, SettingsError};
use crate::db;
use crate::state::AppState;

/// Interval between sweeps of the in-memory counter store.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Errors during startup.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Settings could not be loaded or are invalid.
    #[error("settings: {0}")]
    Settings(#[from] SettingsError),

    /// A store could not be reached or prepared.
    #[error("store: {0}")]
    Store(#[from] StoreError),

    /// The identity database could not be reached.
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect the configured stores and assemble the application state.
pub async fn bootstrap(settings: Settings) -> Result<AppState, BootstrapError> {
    let counters = counter_store(&settings).await?;
    let identities = identity_store(&settings).await?;

    tracing::info!(
        counter_store = counters.backend(),
        window_secs = settings.throttle.window_secs,
        max_requests = settings.throttle.max_requests,
        failure_mode = settings.throttle.failure_mode.as_str(),
        "admission gate configured"
    );
    Ok(AppState::new(settings, identities, counters)?)
}

async fn counter_store(settings: &Settings) -> Result<Arc<dyn CounterStore>, BootstrapError> {
    let prefix = settings.throttle.key_prefix.as_str();
    match &settings.stores.redis {
        Some(redis) => {
            let store = RedisCounterStore::connect_with_prefix(&redis.url(), prefix).await?;
            store.ping().await?;
            tracing::info!(url = ?redis, "using redis counter store");
            Ok(Arc::new(store))
        }
        None => {
            let store = Arc::new(MemoryCounterStore::new().with_prefix(prefix));
            spawn_sweeper(Arc::clone(&store), SWEEP_INTERVAL);
            tracing::warn!("no redis configured, counters are process-local");
            Ok(store)
        }
    }
}

async fn identity_store(settings: &Settings) -> Result<Arc<dyn IdentityStore>, BootstrapError> {
    let pool = db::init_pool(settings.stores.database_url.as_deref(), settings.store_timeout()).await?;
    match pool {
        Some(pool) => {
            let store = PgIdentityStore::new(pool);
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        None => {
            if settings.principals.is_empty() {
                tracing::warn!("identity store is empty, every gated request will be rejected");
            }
            Ok(Arc::new(MemoryIdentityStore::new(settings.principals.clone())))
        }
    }
}

/// Periodically drop expired windows from an in-memory counter store.
pub fn spawn_sweeper(store: Arc<MemoryCounterStore>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, remaining = store.len(), "swept expired counters");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_core::WindowPolicy;

    #[tokio::test]
    async fn default_settings_bootstrap_in_memory() {
        let state = bootstrap(Settings::default()).await.unwrap();
        assert_eq!(state.counters.backend(), "memory");
        assert_eq!(state.gate.limiter().policy(), &WindowPolicy::default());
    }

    #[tokio::test]
    async fn unreachable_redis_aborts_boot_even_when_failing_open() {
        let mut settings = Settings::default();
        settings.throttle.failure_mode = keygate_core::FailureMode::Open;
        settings.stores.redis = Some(crate::config::RedisSettings::from_url("not a redis url"));

        let err = bootstrap(settings).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Store(StoreError::Unavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_expired_windows() {
        let store = Arc::new(MemoryCounterStore::new());
        store
            .set_with_expiry("token:a", 0, Duration::from_millis(1))
            .await
            .unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let handle = spawn_sweeper(Arc::clone(&store), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(store.is_empty());
        handle.abort();
    }
}
