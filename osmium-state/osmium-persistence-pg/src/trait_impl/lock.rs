use std::time::Duration;

use async_trait::async_trait;
use osmium_common::{error::Error, lock::LockService};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};
use tokio::time::Instant;

use crate::mapping::db_error_to_domain;

const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lock service backed by Postgres advisory locks.
/// ---
/// Advisory locks are session scoped, so this service keeps its own
/// single-connection pool: acquire and release must observe the same
/// database session, which a shared pool does not guarantee.
#[derive(Debug)]
pub struct PgLockService {
    conn: DatabaseConnection,
}

impl PgLockService {
    pub async fn new(db_url: &str) -> Result<Self, Error> {
        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(1).sqlx_logging(false);

        let conn = Database::connect(opt)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect lock service: {e}")))?;

        Ok(Self { conn })
    }

    async fn query_flag(&self, sql: &str, name: &str, column: &str) -> Result<bool, Error> {
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [name.into()]);

        let row = self
            .conn
            .query_one(stmt)
            .await
            .map_err(db_error_to_domain)?
            .ok_or_else(|| Error::Database("advisory lock query returned no rows".to_string()))?;

        row.try_get("", column).map_err(db_error_to_domain)
    }
}

#[async_trait]
impl LockService for PgLockService {
    async fn acquire(&self, name: &str, timeout: Duration) -> Result<bool, Error> {
        let deadline = Instant::now() + timeout;

        loop {
            let acquired = self
                .query_flag(
                    "SELECT pg_try_advisory_lock(hashtext($1)::bigint) AS acquired",
                    name,
                    "acquired",
                )
                .await?;

            if acquired {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(ACQUIRE_POLL_INTERVAL).await;
        }
    }

    async fn release(&self, name: &str) -> Result<(), Error> {
        let released = self
            .query_flag(
                "SELECT pg_advisory_unlock(hashtext($1)::bigint) AS released",
                name,
                "released",
            )
            .await?;

        if !released {
            return Err(Error::Lock(format!(
                "lock {name} was not held by this session"
            )));
        }

        Ok(())
    }
}
