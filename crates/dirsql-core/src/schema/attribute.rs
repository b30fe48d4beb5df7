//! Attribute type definitions.

use crate::types::DialectTypes;
use serde::Deserialize;

/// A directory attribute type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDef {
    /// Names; the first is canonical, the rest are aliases.
    pub names: Vec<String>,
    /// Syntax identifier (OID or symbolic name).
    #[serde(default)]
    pub syntax: Option<String>,
    /// Declared maximum value length.
    #[serde(default)]
    pub size: Option<u32>,
    /// Whether the attribute holds multiple values.
    #[serde(default)]
    pub multivalued: bool,
    /// Explicit SQL type, optionally with table-scoped variants.
    #[serde(default)]
    pub sql: Option<DialectTypes>,
    /// Tables this attribute is always a column of.
    #[serde(default)]
    pub add_to_tables: Vec<String>,
    /// Tables whose values for this attribute live in a dedicated subtable.
    #[serde(default)]
    pub subtables: Vec<String>,
}

impl AttributeDef {
    /// Create a single-valued attribute with the given syntax.
    pub fn new(name: impl Into<String>, syntax: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            syntax: Some(syntax.into()),
            size: None,
            multivalued: false,
            sql: None,
            add_to_tables: Vec::new(),
            subtables: Vec::new(),
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }

    /// Add an alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.names.push(alias.into());
        self
    }

    /// Declare the maximum value length.
    pub fn sized(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Mark as multivalued.
    pub fn multivalued(mut self) -> Self {
        self.multivalued = true;
        self
    }

    /// Set an explicit SQL type.
    pub fn with_sql(mut self, types: DialectTypes) -> Self {
        self.sql = Some(types);
        self
    }

    /// Always add this attribute as a column of `table`.
    pub fn add_to_table(mut self, table: impl Into<String>) -> Self {
        self.add_to_tables.push(table.into());
        self
    }

    /// Store this attribute's values for `table` in a subtable.
    pub fn with_subtable(mut self, table: impl Into<String>) -> Self {
        self.subtables.push(table.into());
        self
    }

    /// Whether `name` is one of this attribute's names.
    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// Whether values for `table` are routed to a subtable.
    pub fn routed_to_subtable(&self, table: &str) -> bool {
        self.subtables.iter().any(|t| t == table)
    }

    /// Whether this attribute is always added to `table`.
    pub fn always_in(&self, table: &str) -> bool {
        self.add_to_tables.iter().any(|t| t == table)
    }
}
