//! Database sessions.
//!
//! A session executes rendered DDL and answers catalog questions for the
//! bootstrap. One session is used for the whole run; every statement is its
//! own unit of work.

mod memory;
#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::MemorySession;
#[cfg(feature = "mysql")]
pub use mysql::MySqlSession;
#[cfg(feature = "postgres")]
pub use postgres::PgSession;

use crate::dialect::ServerVersion;
use crate::error::SessionError;
use crate::statement::Statement;

/// A live, already-authenticated database session.
pub trait Session {
    /// Execute one statement.
    ///
    /// `sql` is the rendered text; `statement` is the structure it was rendered
    /// from, for sessions that track the catalog themselves.
    fn execute(&mut self, sql: &str, statement: &Statement) -> Result<(), SessionError>;

    /// Whether `table` exists.
    fn table_exists(&mut self, table: &str) -> Result<bool, SessionError>;

    /// Column names of `table`, in catalog order.
    fn table_columns(&mut self, table: &str) -> Result<Vec<String>, SessionError>;

    /// Whether an index named `index` exists on `table`.
    fn index_exists(&mut self, table: &str, index: &str) -> Result<bool, SessionError>;

    /// Version reported by the server, if the session can tell.
    fn server_version(&mut self) -> Result<Option<ServerVersion>, SessionError> {
        Ok(None)
    }
}

/// SQLSTATE codes for objects that already exist.
#[cfg(any(feature = "postgres", feature = "mysql"))]
const DUPLICATE_STATES: &[&str] = &["42P07", "42701", "42S01", "42S21"];

/// SQLSTATE codes for missing tables.
#[cfg(any(feature = "postgres", feature = "mysql"))]
const MISSING_TABLE_STATES: &[&str] = &["42P01", "42S02"];

/// Map a driver error onto [`SessionError`].
#[cfg(any(feature = "postgres", feature = "mysql"))]
pub(crate) fn classify(err: sqlx::Error) -> SessionError {
    if let sqlx::Error::Database(db) = &err {
        let state = db.code().map(|c| c.into_owned()).unwrap_or_default();
        if DUPLICATE_STATES.contains(&state.as_str()) {
            return SessionError::DuplicateObject(db.message().to_string());
        }
        if MISSING_TABLE_STATES.contains(&state.as_str()) {
            return SessionError::NoSuchTable(db.message().to_string());
        }
        return SessionError::Database(db.message().to_string());
    }
    SessionError::Backend(Box::new(err))
}

/// Build the runtime that blocking sqlx sessions drive their pool with.
#[cfg(any(feature = "postgres", feature = "mysql"))]
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, SessionError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| SessionError::Backend(Box::new(e)))
}
