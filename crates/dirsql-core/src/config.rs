//! Compiler configuration.

use crate::dialect::{DialectAdapter, DialectKind, ServerVersion};
use crate::error::ConfigError;
use crate::types::DialectTypes;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Default person table; gets the `uid` uniqueness guarantee.
pub const DEFAULT_PERSON_TABLE: &str = "gluuPerson";

/// Default key prefix length for indexed text columns on MySQL.
pub const DEFAULT_TEXT_INDEX_PREFIX: u32 = 255;

/// Default number of shadow columns for the legacy JSON index fallback.
pub const DEFAULT_SHADOW_POSITIONS: u32 = 4;

/// Configuration passed explicitly to every compiler stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchemaCompilerConfig {
    /// Target dialect.
    pub dialect: DialectKind,

    /// Server version; decides optional capabilities. None means current.
    pub server_version: Option<ServerVersion>,

    /// Table whose `uid` column must be unique.
    pub person_table: String,

    /// Root object classes whose attributes are never inherited.
    pub root_object_classes: Vec<String>,

    /// Explicit type overrides keyed by `table:attribute` or `attribute`.
    pub type_overrides: BTreeMap<String, DialectTypes>,

    /// Syntax entries layered over the built-in syntax table.
    pub syntax_types: BTreeMap<String, DialectTypes>,

    /// Attributes indexed by the source directory's own index policy.
    pub directory_indexed_attributes: Vec<String>,

    /// Key prefix length when indexing text columns on MySQL.
    pub text_index_prefix: u32,

    /// Array positions materialized by the legacy JSON index fallback.
    pub shadow_positions: u32,

    /// Size of each legacy shadow column.
    pub shadow_column_size: u32,

    /// JSON path of the value array inside multivalued JSON documents.
    pub json_array_path: String,
}

impl Default for SchemaCompilerConfig {
    fn default() -> Self {
        Self {
            dialect: DialectKind::Mysql,
            server_version: None,
            person_table: DEFAULT_PERSON_TABLE.to_string(),
            root_object_classes: vec!["top".to_string()],
            type_overrides: BTreeMap::new(),
            syntax_types: BTreeMap::new(),
            directory_indexed_attributes: Vec::new(),
            text_index_prefix: DEFAULT_TEXT_INDEX_PREFIX,
            shadow_positions: DEFAULT_SHADOW_POSITIONS,
            shadow_column_size: 128,
            json_array_path: "$.v".to_string(),
        }
    }
}

impl SchemaCompilerConfig {
    /// Create a configuration for the given dialect.
    pub fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    /// Parse a configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Malformed {
            document: "compiler configuration".to_string(),
            source,
        })
    }

    /// Load a configuration document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&read_document(path.as_ref())?)
    }

    /// Set the server version.
    pub fn with_server_version(mut self, version: ServerVersion) -> Self {
        self.server_version = Some(version);
        self
    }

    /// Set the person table.
    pub fn with_person_table(mut self, table: impl Into<String>) -> Self {
        self.person_table = table.into();
        self
    }

    /// Add an explicit type override under `key` (`table:attribute` or `attribute`).
    pub fn with_type_override(mut self, key: impl Into<String>, types: DialectTypes) -> Self {
        self.type_overrides.insert(key.into(), types);
        self
    }

    /// Add or replace a syntax table entry.
    pub fn with_syntax_type(mut self, syntax: impl Into<String>, types: DialectTypes) -> Self {
        self.syntax_types.insert(syntax.into(), types);
        self
    }

    /// Set the attributes indexed by the source directory.
    pub fn with_directory_indexes(mut self, attributes: Vec<String>) -> Self {
        self.directory_indexed_attributes = attributes;
        self
    }

    /// Set the number of legacy shadow columns.
    pub fn with_shadow_positions(mut self, positions: u32) -> Self {
        self.shadow_positions = positions;
        self
    }

    /// The dialect policy for this configuration.
    pub fn adapter(&self) -> DialectAdapter {
        DialectAdapter::new(self.dialect, self.server_version)
    }

    /// Whether `name` is a root object class.
    pub fn is_root_class(&self, name: &str) -> bool {
        self.root_object_classes
            .iter()
            .any(|root| root.eq_ignore_ascii_case(name))
    }
}

/// Read a static document from disk.
pub(crate) fn read_document(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })
}
