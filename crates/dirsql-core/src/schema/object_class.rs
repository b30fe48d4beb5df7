//! Object class definitions.

use serde::Deserialize;

/// A directory object class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectClassDef {
    /// Names; the first is canonical and becomes the table name.
    pub names: Vec<String>,
    /// Parent classes whose `may` attributes are inherited.
    #[serde(default, alias = "sup")]
    pub parents: Vec<String>,
    /// Classes whose `may` attributes are merged in.
    #[serde(default)]
    pub merge: Vec<String>,
    /// Allowed attributes.
    #[serde(default)]
    pub may: Vec<String>,
    /// Extra columns added to this class's table.
    #[serde(default)]
    pub include: Vec<String>,
    /// Excluded from relational mapping entirely.
    #[serde(default)]
    pub ignore: bool,
}

impl ObjectClassDef {
    /// Create an object class with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            parents: Vec::new(),
            merge: Vec::new(),
            may: Vec::new(),
            include: Vec::new(),
            ignore: false,
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }

    /// Add a parent class.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Merge attributes from another class.
    pub fn with_merge(mut self, class: impl Into<String>) -> Self {
        self.merge.push(class.into());
        self
    }

    /// Set the allowed attributes.
    pub fn with_may<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.may.extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Add an extra column.
    pub fn with_include(mut self, attribute: impl Into<String>) -> Self {
        self.include.push(attribute.into());
        self
    }

    /// Exclude from relational mapping.
    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Fold a later re-declaration of the same class into this one.
    pub(crate) fn extend_from(&mut self, other: ObjectClassDef) {
        for name in other.names {
            if !self.names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                self.names.push(name);
            }
        }
        self.parents.extend(other.parents);
        self.merge.extend(other.merge);
        self.may.extend(other.may);
        self.include.extend(other.include);
        self.ignore |= other.ignore;
    }
}
