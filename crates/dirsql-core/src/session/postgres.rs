//! PostgreSQL session.
//!
//! Enable with `--features postgres`.

use super::{classify, runtime, Session};
use crate::dialect::ServerVersion;
use crate::error::SessionError;
use crate::statement::Statement;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::runtime::Runtime;
use tracing::debug;

/// Blocking session over a single PostgreSQL connection.
pub struct PgSession {
    pool: PgPool,
    rt: Runtime,
}

impl PgSession {
    /// Connect to `database_url`.
    pub fn connect(database_url: &str) -> Result<Self, SessionError> {
        let rt = runtime()?;
        let pool = rt
            .block_on(
                PgPoolOptions::new()
                    .max_connections(1)
                    .connect(database_url),
            )
            .map_err(classify)?;
        debug!("Connected to PostgreSQL");
        Ok(Self { pool, rt })
    }
}

impl Session for PgSession {
    fn execute(&mut self, sql: &str, _statement: &Statement) -> Result<(), SessionError> {
        self.rt
            .block_on(sqlx::raw_sql(sql).execute(&self.pool))
            .map(|_| ())
            .map_err(classify)
    }

    fn table_exists(&mut self, table: &str) -> Result<bool, SessionError> {
        let row = self
            .rt
            .block_on(
                sqlx::query(
                    "SELECT 1 FROM information_schema.tables \
                     WHERE table_schema = current_schema() AND table_name = $1",
                )
                .bind(table)
                .fetch_optional(&self.pool),
            )
            .map_err(classify)?;
        Ok(row.is_some())
    }

    fn table_columns(&mut self, table: &str) -> Result<Vec<String>, SessionError> {
        self.rt
            .block_on(
                sqlx::query_scalar::<_, String>(
                    "SELECT column_name::text FROM information_schema.columns \
                     WHERE table_schema = current_schema() AND table_name = $1 \
                     ORDER BY ordinal_position",
                )
                .bind(table)
                .fetch_all(&self.pool),
            )
            .map_err(classify)
    }

    fn index_exists(&mut self, table: &str, index: &str) -> Result<bool, SessionError> {
        let row = self
            .rt
            .block_on(
                sqlx::query(
                    "SELECT 1 FROM pg_indexes \
                     WHERE schemaname = current_schema() AND tablename = $1 AND indexname = $2",
                )
                .bind(table)
                .bind(index)
                .fetch_optional(&self.pool),
            )
            .map_err(classify)?;
        Ok(row.is_some())
    }

    fn server_version(&mut self) -> Result<Option<ServerVersion>, SessionError> {
        let raw = self
            .rt
            .block_on(sqlx::query_scalar::<_, String>("SHOW server_version").fetch_one(&self.pool))
            .map_err(classify)?;
        Ok(raw.parse().ok())
    }
}
