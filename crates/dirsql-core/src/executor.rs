//! DDL executor.
//!
//! Renders statements for the session's dialect, runs them, and records each
//! one in the statement log. Existence is checked against the live catalog
//! right before every create.

use crate::audit::StatementLog;
use crate::dialect::DialectAdapter;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::statement::{AddColumn, ColumnDef, CreateTable, IndexSpec, Statement};
use tracing::{debug, info, instrument, warn};

/// Issues DDL against one session.
pub struct DdlExecutor<'a, S: Session + ?Sized> {
    session: &'a mut S,
    log: &'a dyn StatementLog,
    dialect: DialectAdapter,
    issued: usize,
}

impl<'a, S: Session + ?Sized> DdlExecutor<'a, S> {
    /// Create an executor.
    pub fn new(session: &'a mut S, log: &'a dyn StatementLog, dialect: DialectAdapter) -> Self {
        Self {
            session,
            log,
            dialect,
            issued: 0,
        }
    }

    /// The dialect statements are rendered for.
    pub fn dialect(&self) -> &DialectAdapter {
        &self.dialect
    }

    /// Number of statements issued so far, successful or not.
    pub fn issued(&self) -> usize {
        self.issued
    }

    /// Whether `table` exists in the live catalog.
    pub fn table_exists(&mut self, table: &str) -> Result<bool> {
        self.session.table_exists(table).map_err(Error::Introspection)
    }

    /// Live column names of `table`.
    pub fn table_columns(&mut self, table: &str) -> Result<Vec<String>> {
        self.session.table_columns(table).map_err(Error::Introspection)
    }

    /// Whether `table` has a column named `column`, ignoring ASCII case.
    pub fn column_exists(&mut self, table: &str, column: &str) -> Result<bool> {
        Ok(self
            .table_columns(table)?
            .iter()
            .any(|c| c.eq_ignore_ascii_case(column)))
    }

    /// Whether index `index` exists on `table`.
    pub fn index_exists(&mut self, table: &str, index: &str) -> Result<bool> {
        self.session
            .index_exists(table, index)
            .map_err(Error::Introspection)
    }

    /// Create a table unless one with the same name exists.
    ///
    /// Returns whether the table was created.
    #[instrument(skip_all, fields(table = %create.name))]
    pub fn create_table_if_absent(&mut self, create: CreateTable) -> Result<bool> {
        if self.table_exists(&create.name)? {
            debug!("Table already exists");
            return Ok(false);
        }
        self.execute(&Statement::CreateTable(create))?;
        Ok(true)
    }

    /// Add a column.
    ///
    /// The caller must have checked that the column is missing; a duplicate
    /// column is reported as an execution error.
    #[instrument(skip_all, fields(table = %table, column = %column.name))]
    pub fn add_column(&mut self, table: &str, column: ColumnDef) -> Result<()> {
        self.execute(&Statement::AddColumn(AddColumn {
            table: table.to_string(),
            column,
        }))
    }

    /// Create an index unless one with the same name exists on its table.
    ///
    /// Returns whether the index was created.
    #[instrument(
        skip_all,
        fields(table = %index.table, index = %index.name, kind = %index.kind)
    )]
    pub fn create_index_if_absent(&mut self, mut index: IndexSpec) -> Result<bool> {
        index.name = self.dialect.fit_identifier(&index.name);
        if self.index_exists(&index.table, &index.name)? {
            debug!("Index already exists");
            return Ok(false);
        }
        self.execute(&Statement::CreateIndex(index))?;
        Ok(true)
    }

    /// Apply a planned statement unless its object already exists.
    ///
    /// Returns whether the statement was issued.
    pub fn apply_if_absent(&mut self, statement: Statement) -> Result<bool> {
        match statement {
            Statement::CreateTable(create) => self.create_table_if_absent(create),
            Statement::AddColumn(add) => {
                if self.column_exists(&add.table, &add.column.name)? {
                    debug!(table = %add.table, column = %add.column.name, "Column already exists");
                    return Ok(false);
                }
                self.add_column(&add.table, add.column)?;
                Ok(true)
            }
            Statement::CreateIndex(index) => self.create_index_if_absent(index),
        }
    }

    /// Render and run `statement`, logging it whatever the outcome.
    pub fn execute(&mut self, statement: &Statement) -> Result<()> {
        let sql = self.dialect.render(statement);
        let outcome = self.session.execute(&sql, statement);
        let logged = self.log.record(&sql);
        self.issued += 1;

        if let Err(source) = outcome {
            if let Err(err) = logged {
                warn!(error = %err, statement = %sql, "Failed to record statement");
            }
            return Err(Error::Execution {
                statement: sql,
                source,
            });
        }
        logged?;

        info!(verb = statement.verb(), table = statement.table(), "Executed statement");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryStatementLog;
    use crate::dialect::DialectKind;
    use crate::error::SessionError;
    use crate::session::MemorySession;
    use crate::statement::IndexColumn;
    use crate::types::ColumnType;

    fn table(name: &str) -> CreateTable {
        CreateTable::new(name, vec!["doc_id".into()])
            .with_column(ColumnDef::new("doc_id", ColumnType::Varchar(64)).not_null())
            .with_column(ColumnDef::new("uid", ColumnType::Varchar(64)))
    }

    #[test]
    fn test_create_table_skips_existing() {
        let mut session = MemorySession::new().with_table("gluuPerson", ["doc_id"]);
        let log = MemoryStatementLog::new();
        let mut executor =
            DdlExecutor::new(&mut session, &log, DialectAdapter::new(DialectKind::Mysql, None));

        assert!(!executor.create_table_if_absent(table("gluuPerson")).unwrap());
        assert!(executor.create_table_if_absent(table("jansClnt")).unwrap());
        assert_eq!(executor.issued(), 1);

        assert_eq!(session.count("CREATE TABLE"), 1);
        assert_eq!(log.len(), 1);
        assert!(log.lines()[0].starts_with("CREATE TABLE `jansClnt`"));
    }

    #[test]
    fn test_duplicate_column_is_not_swallowed() {
        let mut session = MemorySession::new().with_table("gluuPerson", ["doc_id", "uid"]);
        let log = MemoryStatementLog::new();
        let mut executor =
            DdlExecutor::new(&mut session, &log, DialectAdapter::new(DialectKind::Pgsql, None));

        let err = executor
            .add_column("gluuPerson", ColumnDef::new("uid", ColumnType::Varchar(64)))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Execution {
                source: SessionError::DuplicateObject(_),
                ..
            }
        ));
        // Failed statements are still logged.
        assert_eq!(log.lines(), vec![r#"ALTER TABLE "gluuPerson" ADD COLUMN "uid" VARCHAR(64)"#]);
    }

    #[test]
    fn test_index_existence_check() {
        let mut session = MemorySession::new()
            .with_table("gluuPerson", ["doc_id", "uid"])
            .with_index("gluuPerson", "gluuPerson_uidIdx");
        let log = MemoryStatementLog::new();
        let mut executor =
            DdlExecutor::new(&mut session, &log, DialectAdapter::new(DialectKind::Spanner, None));

        let index = IndexSpec::plain("gluuPerson_uidIdx", "gluuPerson", IndexColumn::new("uid"));
        assert!(!executor.create_index_if_absent(index).unwrap());
        assert!(log.is_empty());
    }

    #[test]
    fn test_long_index_name_checked_under_fitted_name() {
        let table = "jansUmaResourcePermission";
        let column = "jansUmaPermissionClaimsGatheringTicket";
        let mut session = MemorySession::new().with_table(table, ["doc_id", column]);
        let log = MemoryStatementLog::new();
        let dialect = DialectAdapter::new(DialectKind::Pgsql, None);
        let mut executor = DdlExecutor::new(&mut session, &log, dialect);

        let name = format!("{table}_{column}Idx_long_name");
        let index = IndexSpec::plain(name, table, IndexColumn::new(column));
        assert!(executor.create_index_if_absent(index.clone()).unwrap());
        assert!(!executor.create_index_if_absent(index.clone()).unwrap());
        assert_eq!(executor.issued(), 1);

        let fitted = dialect.fit_identifier(&index.name);
        assert!(fitted.len() <= dialect.max_identifier_len());
        assert_eq!(session.indexes(table), vec![fitted.as_str()]);
    }

    struct BrokenLog;

    impl StatementLog for BrokenLog {
        fn record(&self, _statement: &str) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_log_failure_reported_after_successful_statement() {
        let mut session = MemorySession::new();
        let log = BrokenLog;
        let mut executor =
            DdlExecutor::new(&mut session, &log, DialectAdapter::new(DialectKind::Mysql, None));

        let err = executor.create_table_if_absent(table("jansClnt")).unwrap_err();
        assert!(matches!(err, Error::AuditLog(_)));
        assert_eq!(session.count("CREATE TABLE"), 1);
    }

    #[test]
    fn test_statement_failure_wins_over_log_failure() {
        let mut session = MemorySession::new();
        let log = BrokenLog;
        let mut executor =
            DdlExecutor::new(&mut session, &log, DialectAdapter::new(DialectKind::Mysql, None));

        let err = executor
            .add_column("missing", ColumnDef::new("uid", ColumnType::Varchar(64)))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Execution {
                source: SessionError::NoSuchTable(_),
                ..
            }
        ));
        assert_eq!(executor.issued(), 1);
    }

    #[test]
    fn test_apply_shadow_column_once() {
        let mut session = MemorySession::new().with_table("gluuPerson", ["doc_id", "mail"]);
        let log = MemoryStatementLog::new();
        let mut executor =
            DdlExecutor::new(&mut session, &log, DialectAdapter::new(DialectKind::Mysql, None));

        let add = Statement::AddColumn(AddColumn {
            table: "gluuPerson".into(),
            column: ColumnDef::new("mail_mem_idx_0", ColumnType::Varchar(128))
                .generated("`mail`->>'$.v[0]'"),
        });
        assert!(executor.apply_if_absent(add.clone()).unwrap());
        assert!(!executor.apply_if_absent(add).unwrap());
        assert_eq!(session.count("ALTER TABLE"), 1);
    }
}
