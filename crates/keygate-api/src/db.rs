//! # Database
//!
//! Optional PostgreSQL pool for the identity store. When no database URL is
//! configured the gate runs on the in-memory identity store.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connections held by the identity-store pool.
const MAX_CONNECTIONS: u32 = 10;

/// Connect to `database_url`, or return `None` when it is unset.
pub async fn init_pool(
    database_url: Option<&str>,
    acquire_timeout: Duration,
) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = database_url else {
        tracing::info!("no database configured, using in-memory identity store");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(acquire_timeout)
        .connect(url)
        .await?;
    tracing::info!("connected to identity database");
    Ok(Some(pool))
}
