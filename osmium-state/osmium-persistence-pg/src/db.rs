use std::sync::Arc;

use osmium_common::{error::Error, registry::TaskRegistry};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Task store backed by a Postgres `tasks` table.
/// ---
/// Carries the codec registry so every read can decode task bodies into
/// their typed payloads.
#[derive(Debug, Clone)]
pub struct PgStateDb {
    pub(crate) conn: DatabaseConnection,
    pub(crate) registry: Arc<TaskRegistry>,
}

impl PgStateDb {
    pub async fn new(db_url: &str, registry: Arc<TaskRegistry>) -> Result<Self, Error> {
        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.sqlx_logging(false);

        let conn = Database::connect(opt)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {e}")))?;

        Ok(Self { conn, registry })
    }
}
