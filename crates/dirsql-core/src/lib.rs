//! dirsql core - directory schema to SQL compiler.
//!
//! Compiles LDAP-style object classes and attribute definitions into tables,
//! multivalue subtables and indexes for MySQL, PostgreSQL and Spanner, and
//! applies them additively to a live database.

pub mod audit;
pub mod config;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod plan;
pub mod policy;
pub mod schema;
pub mod session;
pub mod statement;
pub mod types;

pub use audit::{FileStatementLog, MemoryStatementLog, NullStatementLog, StatementLog};
pub use config::SchemaCompilerConfig;
pub use dialect::{DialectAdapter, DialectKind, JsonIndexStrategy, ServerVersion};
pub use error::{ConfigError, Error, Result, SessionError};
pub use executor::DdlExecutor;
pub use pipeline::{BootstrapReport, IndexReport, MaterializedSchema, SchemaCompiler};
pub use plan::{
    IndexPlanner, SchemaPlan, SubtableDefinition, TableDefinition, TypeMapper,
};
pub use policy::IndexPolicy;
pub use schema::{AttributeDef, DirectorySchema, ObjectClassDef, SchemaDocument};
pub use session::{MemorySession, Session};
pub use statement::{IndexKind, IndexSpec, Statement};
pub use types::ColumnType;

// Database sessions
#[cfg(feature = "mysql")]
pub use session::MySqlSession;
#[cfg(feature = "postgres")]
pub use session::PgSession;
