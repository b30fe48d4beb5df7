//! Relational planning: tables, subtables, and indexes.
//!
//! Plans are recomputed on every run and never persisted. The executor diffs
//! them against live catalog metadata right before each statement.

mod index;
mod mapper;
mod subtable;
mod table;

pub use index::IndexPlanner;
pub use mapper::{builtin_syntax_table, TypeMapper};
pub use subtable::plan_subtables;
pub use table::plan_tables;

use crate::dialect::DialectAdapter;
use crate::statement::{ColumnDef, CreateTable, IndexSpec};
use crate::types::ColumnType;

/// Surrogate primary key column.
pub const DOC_ID: &str = "doc_id";
/// Second key column of a subtable.
pub const DICT_DOC_ID: &str = "dict_doc_id";
/// Bookkeeping column holding the entry's object classes.
pub const OBJECT_CLASS: &str = "objectClass";
/// Bookkeeping column holding the entry's distinguished name.
pub const DN: &str = "dn";
/// Attribute made unique on the person table.
pub const UID: &str = "uid";

/// Columns every table starts with.
pub fn bookkeeping_columns() -> Vec<Column> {
    vec![
        Column::new(DOC_ID, ColumnType::Varchar(64)),
        Column::new(OBJECT_CLASS, ColumnType::Varchar(48)),
        Column::new(DN, ColumnType::Varchar(128)),
    ]
}

/// Whether `name` is one of the bookkeeping columns.
pub fn is_bookkeeping(name: &str) -> bool {
    [DOC_ID, OBJECT_CLASS, DN]
        .iter()
        .any(|c| c.eq_ignore_ascii_case(name))
}

/// A planned column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Resolved column type.
    pub column_type: ColumnType,
}

impl Column {
    /// Create a column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    /// The column as it appears in DDL.
    pub fn to_def(&self) -> ColumnDef {
        let def = ColumnDef::new(self.name.clone(), self.column_type.clone());
        if self.name == DOC_ID {
            def.not_null()
        } else {
            def
        }
    }
}

/// The relational table planned for one object class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    /// Table name (the object class's canonical name).
    pub name: String,
    /// Columns in order, bookkeeping columns first.
    pub columns: Vec<Column>,
}

impl TableDefinition {
    /// Create a table holding only the bookkeeping columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: bookkeeping_columns(),
        }
    }

    /// Look up a column, ignoring ASCII case.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Columns derived from attributes.
    pub fn attribute_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !is_bookkeeping(&c.name))
    }

    /// The `CREATE TABLE` statement for this table.
    ///
    /// On dialects with inline uniqueness the person table declares `UNIQUE (uid)`.
    pub fn to_create(&self, dialect: &DialectAdapter, person_table: &str) -> CreateTable {
        let mut create = CreateTable::new(self.name.clone(), vec![DOC_ID.to_string()]);
        for column in &self.columns {
            create = create.with_column(column.to_def());
        }
        if dialect.supports_inline_unique() && self.name == person_table {
            if let Some(uid) = self.column(UID) {
                create = create.with_unique(uid.name.clone());
            }
        }
        create
    }
}

/// A child table holding one row per value of a multivalued attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtableDefinition {
    /// Parent table.
    pub parent: String,
    /// Attribute stored in the subtable; also the value column name.
    pub attribute: String,
    /// Type of the value column.
    pub value_type: ColumnType,
}

impl SubtableDefinition {
    /// Subtable name, `<parent>_<attribute>`.
    pub fn name(&self) -> String {
        format!("{}_{}", self.parent, self.attribute)
    }

    /// Name of the secondary index on the value column.
    pub fn index_name(&self) -> String {
        format!("{}Idx", self.name())
    }

    /// Columns in order: `doc_id`, `dict_doc_id`, value column.
    pub fn columns(&self) -> Vec<Column> {
        vec![
            Column::new(DOC_ID, ColumnType::Varchar(64)),
            Column::new(DICT_DOC_ID, ColumnType::Varchar(64)),
            Column::new(self.attribute.clone(), self.value_type.clone()),
        ]
    }

    /// The value column.
    pub fn value_column(&self) -> Column {
        Column::new(self.attribute.clone(), self.value_type.clone())
    }

    /// Secondary index on the value column.
    pub fn to_index(&self, dialect: &DialectAdapter, text_prefix: u32) -> IndexSpec {
        IndexSpec::plain(
            self.index_name(),
            self.name(),
            index::key_column(&self.value_column(), dialect, text_prefix),
        )
    }

    /// The `CREATE TABLE` statement, keyed `(doc_id, dict_doc_id)` under the parent.
    pub fn to_create(&self) -> CreateTable {
        CreateTable::new(self.name(), vec![DOC_ID.to_string(), DICT_DOC_ID.to_string()])
            .with_column(ColumnDef::new(DOC_ID, ColumnType::Varchar(64)).not_null())
            .with_column(ColumnDef::new(DICT_DOC_ID, ColumnType::Varchar(64)).not_null())
            .with_column(self.value_column().to_def())
            .with_parent(self.parent.clone())
    }
}

/// Output of the planning stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaPlan {
    /// Tables in object class order.
    pub tables: Vec<TableDefinition>,
    /// Subtables in attribute order.
    pub subtables: Vec<SubtableDefinition>,
}
