//! In-memory session.

use super::Session;
use crate::dialect::ServerVersion;
use crate::error::SessionError;
use crate::statement::{IndexTarget, Statement};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    columns: Vec<String>,
    indexes: BTreeSet<String>,
}

impl MemoryTable {
    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(name))
    }
}

/// A catalog held in memory.
///
/// Tracks tables, columns and indexes from the statements it executes, counts
/// what it was asked to run, and rejects duplicates the way a real server
/// would. Used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    tables: BTreeMap<String, MemoryTable>,
    executed: Vec<(&'static str, String)>,
    version: Option<ServerVersion>,
}

impl MemorySession {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with the given columns.
    pub fn with_table<I, S>(mut self, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.tables.entry(table.into()).or_default();
        entry.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Seed an index on an already seeded table.
    pub fn with_index(mut self, table: &str, index: impl Into<String>) -> Self {
        if let Some(entry) = self.tables.get_mut(table) {
            entry.indexes.insert(index.into());
        }
        self
    }

    /// Report `version` as the server version.
    pub fn with_version(mut self, version: ServerVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Every statement executed so far, in order.
    pub fn executed(&self) -> Vec<&str> {
        self.executed.iter().map(|(_, sql)| sql.as_str()).collect()
    }

    /// Number of statements executed.
    pub fn statement_count(&self) -> usize {
        self.executed.len()
    }

    /// Number of executed statements with the given verb, e.g. `"CREATE TABLE"`.
    pub fn count(&self, verb: &str) -> usize {
        self.executed.iter().filter(|(v, _)| *v == verb).count()
    }

    /// Forget the statement history, keeping the catalog.
    pub fn reset_counts(&mut self) {
        self.executed.clear();
    }

    /// Names of all tables.
    pub fn tables(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Names of the indexes on `table`.
    pub fn indexes(&self, table: &str) -> Vec<&str> {
        self.tables
            .get(table)
            .map(|t| t.indexes.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn table_mut(&mut self, table: &str) -> Result<&mut MemoryTable, SessionError> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| SessionError::NoSuchTable(table.to_string()))
    }

    fn apply(&mut self, statement: &Statement) -> Result<(), SessionError> {
        match statement {
            Statement::CreateTable(create) => {
                if self.tables.contains_key(&create.name) {
                    return Err(SessionError::DuplicateObject(create.name.clone()));
                }
                if let Some(parent) = &create.parent {
                    if !self.tables.contains_key(parent) {
                        return Err(SessionError::NoSuchTable(parent.clone()));
                    }
                }
                let table = MemoryTable {
                    columns: create.columns.iter().map(|c| c.name.clone()).collect(),
                    indexes: BTreeSet::new(),
                };
                self.tables.insert(create.name.clone(), table);
            }
            Statement::AddColumn(add) => {
                let table = self.table_mut(&add.table)?;
                if table.has_column(&add.column.name) {
                    return Err(SessionError::DuplicateObject(format!(
                        "{}.{}",
                        add.table, add.column.name
                    )));
                }
                table.columns.push(add.column.name.clone());
            }
            Statement::CreateIndex(index) => {
                let table = self.table_mut(&index.table)?;
                if table.indexes.contains(&index.name) {
                    return Err(SessionError::DuplicateObject(index.name.clone()));
                }
                if let IndexTarget::Columns(columns) = &index.target {
                    if let Some(missing) = columns.iter().find(|c| !table.has_column(&c.name)) {
                        return Err(SessionError::Database(format!(
                            "unknown column {} in {}",
                            missing.name, index.table
                        )));
                    }
                }
                table.indexes.insert(index.name.clone());
            }
        }
        Ok(())
    }
}

impl Session for MemorySession {
    fn execute(&mut self, sql: &str, statement: &Statement) -> Result<(), SessionError> {
        self.executed.push((statement.verb(), sql.to_string()));
        self.apply(statement)
    }

    fn table_exists(&mut self, table: &str) -> Result<bool, SessionError> {
        Ok(self.tables.contains_key(table))
    }

    fn table_columns(&mut self, table: &str) -> Result<Vec<String>, SessionError> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    fn index_exists(&mut self, table: &str, index: &str) -> Result<bool, SessionError> {
        Ok(self
            .tables
            .get(table)
            .is_some_and(|t| t.indexes.contains(index)))
    }

    fn server_version(&mut self) -> Result<Option<ServerVersion>, SessionError> {
        Ok(self.version)
    }
}
