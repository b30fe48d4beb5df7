//! Per-dialect index policy document.
//!
//! ```json
//! {
//!   "mysql": {
//!     "__common__": {"fields": ["uid", "mail"], "JSON": ["(CAST({field}->'$.v' AS CHAR(128) ARRAY))"]},
//!     "jansPerson": {"fields": ["jansStatus"], "custom": ["(lower(`uid`))"]}
//!   }
//! }
//! ```
//!
//! `{field}` in a JSON template is replaced by the quoted column name.

use crate::config::read_document;
use crate::dialect::DialectKind;
use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Placeholder substituted in JSON-path templates.
pub const FIELD_PLACEHOLDER: &str = "{field}";

/// Section shared by every table of a dialect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommonIndexPolicy {
    /// Columns indexed on every table that has them.
    pub fields: Vec<String>,
    /// JSON-path index expression templates.
    #[serde(alias = "JSON")]
    pub json: Vec<String>,
}

/// Section for a single table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableIndexPolicy {
    /// Columns indexed on this table.
    pub fields: Vec<String>,
    /// Raw index expressions emitted verbatim.
    pub custom: Vec<String>,
}

/// Index policy for one dialect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DialectIndexPolicy {
    /// The `__common__` section.
    #[serde(rename = "__common__", default)]
    pub common: CommonIndexPolicy,
    /// Per-table sections.
    #[serde(flatten)]
    pub tables: BTreeMap<String, TableIndexPolicy>,
}

impl DialectIndexPolicy {
    /// The section for `table`, if any.
    pub fn table(&self, table: &str) -> Option<&TableIndexPolicy> {
        self.tables.get(table)
    }

    /// Explicit per-table fields for `table`.
    pub fn table_fields(&self, table: &str) -> &[String] {
        self.table(table).map(|t| t.fields.as_slice()).unwrap_or(&[])
    }

    /// Custom expressions for `table`.
    pub fn custom(&self, table: &str) -> &[String] {
        self.table(table).map(|t| t.custom.as_slice()).unwrap_or(&[])
    }
}

/// The whole index policy document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndexPolicy {
    /// MySQL-like section.
    pub mysql: DialectIndexPolicy,
    /// PostgreSQL-like section.
    #[serde(alias = "postgres", alias = "postgresql")]
    pub pgsql: DialectIndexPolicy,
    /// Distributed-SQL section.
    pub spanner: DialectIndexPolicy,
}

impl IndexPolicy {
    /// Parse an index policy document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Malformed {
            document: "index policy".to_string(),
            source,
        })
    }

    /// Load an index policy document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&read_document(path.as_ref())?)
    }

    /// The section for `dialect`.
    pub fn for_dialect(&self, dialect: DialectKind) -> &DialectIndexPolicy {
        match dialect {
            DialectKind::Mysql => &self.mysql,
            DialectKind::Pgsql => &self.pgsql,
            DialectKind::Spanner => &self.spanner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy() {
        let policy = IndexPolicy::from_json(
            r#"{
                "mysql": {
                    "__common__": {"fields": ["uid"], "JSON": ["(CAST({field}->'$.v' AS CHAR(128) ARRAY))"]},
                    "jansPerson": {"fields": ["jansStatus"], "custom": ["(lower(`uid`))"]}
                },
                "postgres": {"__common__": {"json": ["{field} jsonb_path_ops"]}}
            }"#,
        )
        .unwrap();

        let mysql = policy.for_dialect(DialectKind::Mysql);
        assert_eq!(mysql.common.fields, vec!["uid"]);
        assert_eq!(mysql.common.json.len(), 1);
        assert_eq!(mysql.table_fields("jansPerson"), ["jansStatus".to_string()]);
        assert_eq!(mysql.custom("jansPerson").len(), 1);
        assert!(mysql.custom("jansClnt").is_empty());
        assert!(!mysql.tables.contains_key("__common__"));

        let pg = policy.for_dialect(DialectKind::Pgsql);
        assert_eq!(pg.common.json, vec!["{field} jsonb_path_ops"]);
        assert_eq!(policy.for_dialect(DialectKind::Spanner), &DialectIndexPolicy::default());
    }

    #[test]
    fn test_malformed_policy() {
        assert!(matches!(
            IndexPolicy::from_json(r#"{"mysql": {"jansPerson": {"fields": "uid"}}}"#),
            Err(ConfigError::Malformed { .. })
        ));
    }
}
