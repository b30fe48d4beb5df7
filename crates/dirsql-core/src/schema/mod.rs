//! Directory schema model.
//!
//! Schema documents are loaded once at start-up and merged, in load order,
//! into a [`DirectorySchema`] that indexes attributes and object classes by
//! every name they carry (case-insensitively, as directories compare them).

mod attribute;
mod object_class;

pub use attribute::AttributeDef;
pub use object_class::ObjectClassDef;

use crate::config::read_document;
use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One static schema document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaDocument {
    /// Attribute type definitions.
    pub attribute_types: Vec<AttributeDef>,
    /// Object class definitions.
    pub object_classes: Vec<ObjectClassDef>,
}

impl SchemaDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a schema document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Malformed {
            document: "schema document".to_string(),
            source,
        })
    }

    /// Load a schema document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        serde_json::from_str(&read_document(path)?).map_err(|source| ConfigError::Malformed {
            document: path.display().to_string(),
            source,
        })
    }

    /// Add an attribute definition.
    pub fn with_attribute(mut self, attribute: AttributeDef) -> Self {
        self.attribute_types.push(attribute);
        self
    }

    /// Add an object class definition.
    pub fn with_object_class(mut self, class: ObjectClassDef) -> Self {
        self.object_classes.push(class);
        self
    }
}

/// The merged, indexed schema.
#[derive(Debug, Clone, Default)]
pub struct DirectorySchema {
    attributes: Vec<AttributeDef>,
    attribute_index: HashMap<String, usize>,
    object_classes: Vec<ObjectClassDef>,
    class_index: HashMap<String, usize>,
}

impl DirectorySchema {
    /// Merge documents in order.
    ///
    /// A later attribute with an already known name replaces the earlier
    /// definition; a later object class with a known name extends it.
    pub fn from_documents<I>(documents: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = SchemaDocument>,
    {
        let mut schema = DirectorySchema::default();
        for document in documents {
            schema.merge(document)?;
        }
        Ok(schema)
    }

    /// Load and merge documents from disk.
    pub fn from_paths<I, P>(paths: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let documents = paths
            .into_iter()
            .map(SchemaDocument::from_path)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_documents(documents)
    }

    fn merge(&mut self, document: SchemaDocument) -> Result<(), ConfigError> {
        for (position, attribute) in document.attribute_types.into_iter().enumerate() {
            if attribute.names.is_empty() {
                return Err(ConfigError::Unnamed {
                    kind: "attribute",
                    position,
                });
            }
            let existing = attribute
                .names
                .iter()
                .find_map(|n| self.attribute_index.get(&n.to_ascii_lowercase()).copied());
            let slot = match existing {
                Some(slot) => {
                    debug!(attribute = attribute.name(), "Replacing attribute definition");
                    self.attributes[slot] = attribute;
                    slot
                }
                None => {
                    self.attributes.push(attribute);
                    self.attributes.len() - 1
                }
            };
            for name in &self.attributes[slot].names {
                self.attribute_index.insert(name.to_ascii_lowercase(), slot);
            }
        }

        for (position, class) in document.object_classes.into_iter().enumerate() {
            if class.names.is_empty() {
                return Err(ConfigError::Unnamed {
                    kind: "object class",
                    position,
                });
            }
            let existing = class
                .names
                .iter()
                .find_map(|n| self.class_index.get(&n.to_ascii_lowercase()).copied());
            let slot = match existing {
                Some(slot) => {
                    debug!(object_class = class.name(), "Extending object class definition");
                    self.object_classes[slot].extend_from(class);
                    slot
                }
                None => {
                    self.object_classes.push(class);
                    self.object_classes.len() - 1
                }
            };
            for name in &self.object_classes[slot].names {
                self.class_index.insert(name.to_ascii_lowercase(), slot);
            }
        }

        Ok(())
    }

    /// Look up an attribute by any of its names.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attribute_index
            .get(&name.to_ascii_lowercase())
            .map(|&slot| &self.attributes[slot])
    }

    /// Look up an object class by any of its names.
    pub fn object_class(&self, name: &str) -> Option<&ObjectClassDef> {
        self.class_index
            .get(&name.to_ascii_lowercase())
            .map(|&slot| &self.object_classes[slot])
    }

    /// All attributes in definition order.
    pub fn attributes(&self) -> &[AttributeDef] {
        &self.attributes
    }

    /// All object classes in definition order.
    pub fn object_classes(&self) -> &[ObjectClassDef] {
        &self.object_classes
    }

    /// Whether `name` is a multivalued attribute.
    pub fn is_multivalued(&self, name: &str) -> bool {
        self.attribute(name).is_some_and(|a| a.multivalued)
    }
}
