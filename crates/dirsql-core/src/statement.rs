//! Typed DDL statements.
//!
//! Planners build these values; only [`crate::dialect::DialectAdapter`] turns
//! them into SQL text, so identifier quoting lives in a single place.

use crate::types::ColumnType;

/// A column inside a `CREATE TABLE` or `ALTER TABLE ... ADD COLUMN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Column type.
    pub column_type: ColumnType,
    /// Whether the column is declared `NOT NULL`.
    pub not_null: bool,
    /// Generating expression for a virtual column.
    pub generated: Option<String>,
}

impl ColumnDef {
    /// Create a nullable column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null: false,
            generated: None,
        }
    }

    /// Mark the column `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Make the column generated from `expression`.
    pub fn generated(mut self, expression: impl Into<String>) -> Self {
        self.generated = Some(expression.into());
        self
    }
}

/// `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Primary key columns.
    pub primary_key: Vec<String>,
    /// Columns carrying an inline uniqueness constraint.
    pub unique: Vec<String>,
    /// Parent table rows of this table belong to; deletes cascade from it.
    pub parent: Option<String>,
}

impl CreateTable {
    /// Create a table statement keyed on `primary_key`.
    pub fn new(name: impl Into<String>, primary_key: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key,
            unique: Vec::new(),
            parent: None,
        }
    }

    /// Append a column.
    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Add an inline uniqueness constraint.
    pub fn with_unique(mut self, column: impl Into<String>) -> Self {
        self.unique.push(column.into());
        self
    }

    /// Declare the table a child of `parent`.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// `ALTER TABLE ... ADD COLUMN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddColumn {
    /// Table being altered.
    pub table: String,
    /// Column being added.
    pub column: ColumnDef,
}

/// What an index is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Plain secondary index.
    Plain,
    /// Unique index.
    Unique,
    /// Functional index over a JSON path.
    JsonPath,
    /// Raw expression taken verbatim from the index policy.
    Custom,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Plain => write!(f, "plain"),
            IndexKind::Unique => write!(f, "unique"),
            IndexKind::JsonPath => write!(f, "json_path"),
            IndexKind::Custom => write!(f, "custom"),
        }
    }
}

/// A column inside an index key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    /// Column name.
    pub name: String,
    /// Key prefix length for text columns.
    pub prefix_len: Option<u32>,
}

impl IndexColumn {
    /// Index the whole column value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix_len: None,
        }
    }

    /// Index only the first `len` characters.
    pub fn prefix(name: impl Into<String>, len: u32) -> Self {
        Self {
            name: name.into(),
            prefix_len: Some(len),
        }
    }
}

/// What an index key is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexTarget {
    /// One or more columns.
    Columns(Vec<IndexColumn>),
    /// An expression, already rendered for the dialect.
    Expression(String),
}

/// `CREATE INDEX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Index name.
    pub name: String,
    /// Indexed table.
    pub table: String,
    /// Index key.
    pub target: IndexTarget,
    /// Index kind.
    pub kind: IndexKind,
}

impl IndexSpec {
    /// Plain index on a single column.
    pub fn plain(name: impl Into<String>, table: impl Into<String>, column: IndexColumn) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            target: IndexTarget::Columns(vec![column]),
            kind: IndexKind::Plain,
        }
    }

    /// Unique index on a single column.
    pub fn unique(
        name: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            target: IndexTarget::Columns(vec![IndexColumn::new(column)]),
            kind: IndexKind::Unique,
        }
    }

    /// Index over an expression.
    pub fn expression(
        name: impl Into<String>,
        table: impl Into<String>,
        expression: impl Into<String>,
        kind: IndexKind,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            target: IndexTarget::Expression(expression.into()),
            kind,
        }
    }
}

/// A DDL statement the compiler can issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `CREATE TABLE`.
    CreateTable(CreateTable),
    /// `ALTER TABLE ... ADD COLUMN`.
    AddColumn(AddColumn),
    /// `CREATE INDEX`.
    CreateIndex(IndexSpec),
}

impl Statement {
    /// The table the statement creates or modifies.
    pub fn table(&self) -> &str {
        match self {
            Statement::CreateTable(create) => &create.name,
            Statement::AddColumn(add) => &add.table,
            Statement::CreateIndex(index) => &index.table,
        }
    }

    /// Short verb used in logs.
    pub fn verb(&self) -> &'static str {
        match self {
            Statement::CreateTable(_) => "CREATE TABLE",
            Statement::AddColumn(_) => "ALTER TABLE",
            Statement::CreateIndex(_) => "CREATE INDEX",
        }
    }
}
