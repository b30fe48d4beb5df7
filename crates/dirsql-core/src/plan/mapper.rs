//! Attribute to column type resolution.

use crate::config::SchemaCompilerConfig;
use crate::dialect::DialectAdapter;
use crate::schema::{AttributeDef, DirectorySchema};
use crate::types::{ColumnType, DialectTypes, TypeEntry};
use std::collections::BTreeMap;

const LDAP_SYNTAX_PREFIX: &str = "1.3.6.1.4.1.1466.115.121.1.";

/// Built-in syntax table, keyed by lower-cased syntax identifier.
///
/// Covers the standard LDAP syntax OIDs plus a few symbolic names.
pub fn builtin_syntax_table() -> BTreeMap<String, DialectTypes> {
    let string = || DialectTypes::all(TypeEntry::sized("VARCHAR", 64));
    let dn = || DialectTypes::all(TypeEntry::sized("VARCHAR", 128));
    let boolean = || {
        DialectTypes::all(TypeEntry::new("SMALLINT"))
            .with_pgsql(TypeEntry::new("BOOLEAN"))
            .with_spanner(TypeEntry::new("BOOL"))
    };
    let integer = || DialectTypes::all(TypeEntry::new("INT"));
    let time = || {
        DialectTypes::all(TypeEntry::sized("DATETIME", 3))
            .with_pgsql(TypeEntry::new("TIMESTAMP"))
            .with_spanner(TypeEntry::new("TIMESTAMP"))
    };
    let binary = || {
        DialectTypes::all(TypeEntry::new("BLOB"))
            .with_pgsql(TypeEntry::new("BYTEA"))
            .with_spanner(TypeEntry::new("BYTES(MAX)"))
    };

    let mut table = BTreeMap::new();
    // Directory String, IA5, Printable, Numeric, OID, Telephone, Fax, Country
    for suffix in ["15", "26", "44", "36", "38", "50", "22", "11"] {
        table.insert(format!("{LDAP_SYNTAX_PREFIX}{suffix}"), string());
    }
    table.insert(format!("{LDAP_SYNTAX_PREFIX}12"), dn());
    table.insert(
        format!("{LDAP_SYNTAX_PREFIX}41"),
        DialectTypes::all(TypeEntry::sized("VARCHAR", 255)),
    );
    table.insert(format!("{LDAP_SYNTAX_PREFIX}7"), boolean());
    table.insert(format!("{LDAP_SYNTAX_PREFIX}27"), integer());
    table.insert(format!("{LDAP_SYNTAX_PREFIX}24"), time());
    for suffix in ["5", "28", "40"] {
        table.insert(format!("{LDAP_SYNTAX_PREFIX}{suffix}"), binary());
    }

    table.insert("string".to_string(), string());
    table.insert("dn".to_string(), dn());
    table.insert("boolean".to_string(), boolean());
    table.insert("integer".to_string(), integer());
    table.insert("datetime".to_string(), time());
    table.insert("binary".to_string(), binary());
    table.insert("json".to_string(), DialectTypes::all(TypeEntry::new("JSON")));
    table
}

/// Resolves attributes to column types for one dialect.
///
/// Resolution is a pure function of the schema and configuration.
pub struct TypeMapper<'a> {
    schema: &'a DirectorySchema,
    config: &'a SchemaCompilerConfig,
    dialect: DialectAdapter,
    syntax_table: BTreeMap<String, DialectTypes>,
}

impl<'a> TypeMapper<'a> {
    /// Create a mapper; configured syntax entries replace built-in ones.
    pub fn new(schema: &'a DirectorySchema, config: &'a SchemaCompilerConfig) -> Self {
        let mut syntax_table = builtin_syntax_table();
        for (syntax, types) in &config.syntax_types {
            syntax_table.insert(syntax.to_ascii_lowercase(), types.clone());
        }
        Self {
            schema,
            config,
            dialect: config.adapter(),
            syntax_table,
        }
    }

    /// Column type of `attribute` as a column of `table`.
    ///
    /// Never fails: unknown attributes resolve to unbounded text.
    pub fn resolve(&self, attribute: &str, table: &str) -> ColumnType {
        if let Some(explicit) = self.explicit(attribute, table) {
            return explicit;
        }
        match self.schema.attribute(attribute) {
            Some(def) if def.multivalued => self.dialect.collection_type(self.from_syntax(def)),
            Some(def) => self.from_syntax(def),
            None => ColumnType::Text,
        }
    }

    /// Type of a single value of `attribute`, as stored in a subtable of `table`.
    pub fn resolve_scalar(&self, attribute: &str, table: &str) -> ColumnType {
        let def = self.schema.attribute(attribute);
        match self.explicit(attribute, table) {
            Some(ColumnType::Array(element)) => *element,
            Some(ColumnType::Json) | None => match def {
                Some(def) => self.from_syntax(def),
                None => ColumnType::Text,
            },
            Some(explicit) => explicit,
        }
    }

    fn explicit(&self, attribute: &str, table: &str) -> Option<ColumnType> {
        let def = self.schema.attribute(attribute);
        let mut names = vec![attribute];
        if let Some(def) = def {
            if def.name() != attribute {
                names.push(def.name());
            }
        }

        // A key without a variant for this dialect falls through to the next.
        let overrides = &self.config.type_overrides;
        let scoped = names
            .iter()
            .filter_map(|name| overrides.get(&format!("{table}:{name}")));
        let global = names.iter().filter_map(|name| overrides.get(*name));
        let own = def.and_then(|d| d.sql.as_ref());

        let entry = scoped
            .chain(global)
            .chain(own)
            .find_map(|types| types.for_dialect(self.dialect.kind()))?;
        Some(entry.scoped(table).column_type())
    }

    fn from_syntax(&self, def: &AttributeDef) -> ColumnType {
        let entry = def
            .syntax
            .as_deref()
            .and_then(|syntax| self.syntax_table.get(&syntax.to_ascii_lowercase()))
            .and_then(|types| types.for_dialect(self.dialect.kind()));

        match entry {
            Some(entry) if entry.is_character() => match def.size.or(entry.size) {
                Some(size) => ColumnType::character(size),
                None => ColumnType::Text,
            },
            Some(entry) => entry.column_type(),
            None => match def.size {
                Some(size) => ColumnType::character(size),
                None => ColumnType::Text,
            },
        }
    }
}
