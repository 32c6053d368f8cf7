//! # PostgreSQL Identity Store
//!
//! Looks tokens up in the `users` table created by the embedded migrations.

use async_trait::async_trait;
use keygate_core::{ApiToken, PrincipalRecord, StoreError};
use sqlx::PgPool;

use crate::identity::IdentityStore;

/// [`IdentityStore`] over a `sqlx` PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("postgres migration: {e}")))
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    api_key: String,
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_api_key(
        &self,
        token: &ApiToken,
    ) -> Result<Option<PrincipalRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, api_key FROM users WHERE api_key = $1")
            .bind(token.expose())
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(row.map(|row| PrincipalRecord::new(row.id, row.api_key)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(format!("postgres: {err}"))
}
