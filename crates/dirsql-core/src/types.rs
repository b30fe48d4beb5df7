//! Column types and the static type-entry documents they are resolved from.

use crate::dialect::DialectKind;
use serde::Deserialize;
use std::collections::BTreeMap;

/// A dialect-neutral SQL column type.
///
/// Rendering to concrete SQL text is done by [`crate::dialect::DialectAdapter`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Bounded character column (`VARCHAR(n)` / `STRING(n)`).
    Varchar(u32),
    /// Text of at most 255 characters (`TINYTEXT` on MySQL).
    MediumText,
    /// Unbounded text (`TEXT` / `STRING(MAX)`).
    Text,
    /// Boolean flag.
    Boolean,
    /// Signed integer.
    Integer,
    /// 64-bit signed integer.
    BigInt,
    /// JSON document (`JSON` / `JSONB`).
    Json,
    /// Native array of a scalar type.
    Array(Box<ColumnType>),
    /// A type written out verbatim by a static override.
    Other(String),
}

impl ColumnType {
    /// Parse SQL type text from an override or syntax entry.
    ///
    /// Only the forms the compiler reasons about are recognised; anything else
    /// is kept verbatim as [`ColumnType::Other`].
    pub fn parse(sql: &str) -> Self {
        let trimmed = sql.trim();
        let upper = trimmed.to_ascii_uppercase();

        if let Some(inner) = upper
            .strip_prefix("ARRAY<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return ColumnType::Array(Box::new(ColumnType::parse(inner)));
        }

        match upper.as_str() {
            "JSON" | "JSONB" => return ColumnType::Json,
            "TEXT" | "STRING(MAX)" => return ColumnType::Text,
            "TINYTEXT" => return ColumnType::MediumText,
            "BOOL" | "BOOLEAN" => return ColumnType::Boolean,
            "INT" | "INTEGER" => return ColumnType::Integer,
            "BIGINT" | "INT64" => return ColumnType::BigInt,
            _ => {}
        }

        for prefix in ["VARCHAR(", "STRING("] {
            if let Some(size) = upper
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(')'))
                .and_then(|size| size.trim().parse::<u32>().ok())
            {
                return ColumnType::Varchar(size);
            }
        }

        ColumnType::Other(trimmed.to_string())
    }

    /// Character column sized by the directory's size rules.
    ///
    /// Up to 127 keeps the exact size, up to 255 becomes medium text, anything
    /// larger is unbounded text.
    pub fn character(size: u32) -> Self {
        if size <= 127 {
            ColumnType::Varchar(size)
        } else if size <= 255 {
            ColumnType::MediumText
        } else {
            ColumnType::Text
        }
    }

    /// Whether values are stored as a JSON document or native array.
    pub fn is_json_capable(&self) -> bool {
        matches!(self, ColumnType::Json | ColumnType::Array(_))
    }

    /// Whether this is a native array.
    pub fn is_array(&self) -> bool {
        matches!(self, ColumnType::Array(_))
    }

    /// Whether this is a text/blob type that MySQL can only index by prefix.
    pub fn is_text(&self) -> bool {
        match self {
            ColumnType::MediumText | ColumnType::Text => true,
            ColumnType::Other(sql) => {
                let upper = sql.to_ascii_uppercase();
                upper.ends_with("TEXT") || upper.ends_with("BLOB")
            }
            _ => false,
        }
    }
}

/// One entry of a static type document: a type name plus optional size.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct TypeEntry {
    /// SQL type name, e.g. `VARCHAR` or `JSON`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Optional size appended as `TYPE(size)`.
    pub size: Option<u32>,
    /// Table-scoped variants of this entry.
    pub tables: BTreeMap<String, TypeEntry>,
}

impl TypeEntry {
    /// Create an entry without a size.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            size: None,
            tables: BTreeMap::new(),
        }
    }

    /// Create a sized entry.
    pub fn sized(type_name: impl Into<String>, size: u32) -> Self {
        Self {
            size: Some(size),
            ..Self::new(type_name)
        }
    }

    /// Add a table-scoped variant.
    pub fn with_table(mut self, table: impl Into<String>, entry: TypeEntry) -> Self {
        self.tables.insert(table.into(), entry);
        self
    }

    /// The table-scoped variant for `table`, or this entry.
    pub fn scoped(&self, table: &str) -> &TypeEntry {
        self.tables.get(table).unwrap_or(self)
    }

    /// Whether the entry names a character type subject to the size rules.
    pub fn is_character(&self) -> bool {
        matches!(
            self.type_name.to_ascii_uppercase().as_str(),
            "VARCHAR" | "STRING"
        )
    }

    /// The entry written as SQL text.
    pub fn to_sql(&self) -> String {
        match self.size {
            Some(size) => format!("{}({})", self.type_name, size),
            None => self.type_name.clone(),
        }
    }

    /// Resolve the entry to a column type verbatim.
    pub fn column_type(&self) -> ColumnType {
        ColumnType::parse(&self.to_sql())
    }
}

/// Per-dialect variants of a type entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct DialectTypes {
    /// MySQL-like entry; also the fallback for the other dialects.
    pub mysql: Option<TypeEntry>,
    /// PostgreSQL-like entry.
    pub pgsql: Option<TypeEntry>,
    /// Distributed-SQL (Spanner) entry.
    pub spanner: Option<TypeEntry>,
}

impl DialectTypes {
    /// Entry used for every dialect.
    pub fn all(entry: TypeEntry) -> Self {
        Self {
            mysql: Some(entry),
            pgsql: None,
            spanner: None,
        }
    }

    /// Set the PostgreSQL-like entry.
    pub fn with_pgsql(mut self, entry: TypeEntry) -> Self {
        self.pgsql = Some(entry);
        self
    }

    /// Set the distributed-SQL entry.
    pub fn with_spanner(mut self, entry: TypeEntry) -> Self {
        self.spanner = Some(entry);
        self
    }

    /// The entry for `dialect`, falling back to the MySQL-like entry.
    pub fn for_dialect(&self, dialect: DialectKind) -> Option<&TypeEntry> {
        let own = match dialect {
            DialectKind::Mysql => self.mysql.as_ref(),
            DialectKind::Pgsql => self.pgsql.as_ref(),
            DialectKind::Spanner => self.spanner.as_ref(),
        };
        own.or(self.mysql.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_forms() {
        assert_eq!(ColumnType::parse("VARCHAR(64)"), ColumnType::Varchar(64));
        assert_eq!(ColumnType::parse("string(128)"), ColumnType::Varchar(128));
        assert_eq!(ColumnType::parse("STRING(MAX)"), ColumnType::Text);
        assert_eq!(ColumnType::parse("TINYTEXT"), ColumnType::MediumText);
        assert_eq!(ColumnType::parse("jsonb"), ColumnType::Json);
        assert_eq!(
            ColumnType::parse("ARRAY<STRING(MAX)>"),
            ColumnType::Array(Box::new(ColumnType::Text))
        );
        assert_eq!(
            ColumnType::parse("DATETIME(3)"),
            ColumnType::Other("DATETIME(3)".to_string())
        );
    }

    #[test]
    fn test_character_size_rules() {
        assert_eq!(ColumnType::character(1), ColumnType::Varchar(1));
        assert_eq!(ColumnType::character(127), ColumnType::Varchar(127));
        assert_eq!(ColumnType::character(128), ColumnType::MediumText);
        assert_eq!(ColumnType::character(255), ColumnType::MediumText);
        assert_eq!(ColumnType::character(256), ColumnType::Text);
    }

    #[test]
    fn test_classification() {
        assert!(ColumnType::Json.is_json_capable());
        assert!(ColumnType::Array(Box::new(ColumnType::Varchar(10))).is_array());
        assert!(ColumnType::Text.is_text());
        assert!(ColumnType::Other("LONGTEXT".into()).is_text());
        assert!(!ColumnType::Varchar(64).is_text());
    }

    #[test]
    fn test_dialect_fallback_and_table_scope() {
        let types = DialectTypes::all(
            TypeEntry::sized("VARCHAR", 64).with_table("jansClnt", TypeEntry::new("TEXT")),
        )
        .with_spanner(TypeEntry::new("STRING(MAX)"));

        let pg = types.for_dialect(DialectKind::Pgsql).unwrap();
        assert_eq!(pg.to_sql(), "VARCHAR(64)");
        assert_eq!(pg.scoped("jansClnt").to_sql(), "TEXT");
        assert_eq!(pg.scoped("jansPerson").to_sql(), "VARCHAR(64)");

        let spanner = types.for_dialect(DialectKind::Spanner).unwrap();
        assert_eq!(spanner.column_type(), ColumnType::Text);
    }

    #[test]
    fn test_entry_from_json() {
        let types: DialectTypes = serde_json::from_str(
            r#"{"mysql": {"type": "JSON"}, "spanner": {"type": "ARRAY<STRING(MAX)>"}}"#,
        )
        .unwrap();
        assert_eq!(
            types.for_dialect(DialectKind::Mysql).unwrap().column_type(),
            ColumnType::Json
        );
        assert!(types
            .for_dialect(DialectKind::Spanner)
            .unwrap()
            .column_type()
            .is_array());
    }
}
