//! Table planning.

use super::{is_bookkeeping, Column, TableDefinition, TypeMapper};
use crate::config::SchemaCompilerConfig;
use crate::error::ConfigError;
use crate::schema::{DirectorySchema, ObjectClassDef};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Attribute names in first-seen order.
///
/// Aliases collapse onto the canonical name of their definition; undefined
/// names are kept as written. Comparison is case-insensitive.
struct AttributeList<'a> {
    schema: &'a DirectorySchema,
    names: Vec<String>,
    seen: HashSet<String>,
}

impl<'a> AttributeList<'a> {
    fn new(schema: &'a DirectorySchema) -> Self {
        Self {
            schema,
            names: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn push(&mut self, name: &str) {
        let schema = self.schema;
        let name = schema.attribute(name).map_or(name, |def| def.name());
        if is_bookkeeping(name) {
            return;
        }
        if self.seen.insert(name.to_ascii_lowercase()) {
            self.names.push(name.to_string());
        }
    }

    fn extend<'n>(&mut self, names: impl IntoIterator<Item = &'n String>) {
        for name in names {
            self.push(name);
        }
    }
}

/// Plan one table per non-ignored object class, in schema order.
///
/// A dangling parent or merge reference is a configuration error; nothing is
/// planned in that case.
#[instrument(skip_all, fields(dialect = %config.dialect))]
pub fn plan_tables(
    schema: &DirectorySchema,
    config: &SchemaCompilerConfig,
) -> Result<Vec<TableDefinition>, ConfigError> {
    let mapper = TypeMapper::new(schema, config);
    let mut tables = Vec::new();

    for class in schema.object_classes() {
        if class.ignore {
            debug!(object_class = class.name(), "Skipping ignored object class");
            continue;
        }

        let table_name = class.name();
        let mut table = TableDefinition::new(table_name);
        for attribute in collect_attributes(schema, config, class)? {
            let routed = schema
                .attribute(&attribute)
                .is_some_and(|def| def.routed_to_subtable(table_name));
            if routed {
                continue;
            }
            let column_type = mapper.resolve(&attribute, table_name);
            table.columns.push(Column::new(attribute, column_type));
        }

        debug!(
            table = table_name,
            columns = table.columns.len(),
            "Planned table"
        );
        tables.push(table);
    }

    Ok(tables)
}

/// `may` ∪ include ∪ always-added ∪ merged classes' `may` ∪ non-root parents' `may`.
fn collect_attributes(
    schema: &DirectorySchema,
    config: &SchemaCompilerConfig,
    class: &ObjectClassDef,
) -> Result<Vec<String>, ConfigError> {
    let table_name = class.name();
    let mut list = AttributeList::new(schema);

    list.extend(&class.may);
    list.extend(&class.include);
    for attribute in schema.attributes() {
        if attribute.always_in(table_name) {
            list.push(attribute.name());
        }
    }

    for merged in &class.merge {
        let source = schema
            .object_class(merged)
            .ok_or_else(|| ConfigError::UndefinedMerge {
                object_class: table_name.to_string(),
                merged: merged.clone(),
            })?;
        list.extend(&source.may);
    }

    for parent in &class.parents {
        if config.is_root_class(parent) {
            continue;
        }
        let source = schema
            .object_class(parent)
            .ok_or_else(|| ConfigError::UndefinedParent {
                object_class: table_name.to_string(),
                parent: parent.clone(),
            })?;
        list.extend(&source.may);
    }

    Ok(list.names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;
    use crate::schema::{AttributeDef, SchemaDocument};
    use crate::types::ColumnType;

    const STRING: &str = "1.3.6.1.4.1.1466.115.121.1.15";

    fn document() -> SchemaDocument {
        SchemaDocument::new()
            .with_attribute(AttributeDef::new("uid", STRING).sized(64))
            .with_attribute(AttributeDef::new("cn", STRING))
            .with_attribute(AttributeDef::new("sn", STRING))
            .with_attribute(AttributeDef::new("o", STRING))
            .with_attribute(
                AttributeDef::new("mail", STRING)
                    .sized(255)
                    .multivalued()
                    .with_subtable("gluuPerson"),
            )
            .with_attribute(AttributeDef::new("jansExtraConf", STRING).add_to_table("gluuPerson"))
            .with_object_class(ObjectClassDef::new("top").with_may(["objectClass"]))
            .with_object_class(ObjectClassDef::new("person").with_may(["cn", "sn"]))
            .with_object_class(ObjectClassDef::new("organization").with_may(["o", "cn"]))
            .with_object_class(
                ObjectClassDef::new("gluuPerson")
                    .with_parent("top")
                    .with_parent("person")
                    .with_merge("organization")
                    .with_may(["uid", "mail", "UID"]),
            )
            .with_object_class(ObjectClassDef::new("jansTmp").ignored().with_may(["uid"]))
    }

    fn plan(document: SchemaDocument, dialect: DialectKind) -> Result<Vec<TableDefinition>, ConfigError> {
        let schema = DirectorySchema::from_documents([document]).unwrap();
        plan_tables(&schema, &SchemaCompilerConfig::new(dialect))
    }

    #[test]
    fn test_attribute_union_in_first_seen_order() {
        let tables = plan(document(), DialectKind::Mysql).unwrap();
        let person = tables.iter().find(|t| t.name == "gluuPerson").unwrap();

        assert_eq!(
            person.column_names(),
            vec!["doc_id", "objectClass", "dn", "uid", "jansExtraConf", "o", "cn", "sn"]
        );
        assert_eq!(person.column("uid").unwrap().column_type, ColumnType::Varchar(64));
    }

    #[test]
    fn test_subtable_attribute_not_a_parent_column() {
        let tables = plan(document(), DialectKind::Spanner).unwrap();
        let person = tables.iter().find(|t| t.name == "gluuPerson").unwrap();
        assert!(person.column("mail").is_none());
    }

    #[test]
    fn test_ignored_classes_are_skipped() {
        let tables = plan(document(), DialectKind::Mysql).unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["top", "person", "organization", "gluuPerson"]);
    }

    #[test]
    fn test_undefined_parent_is_fatal() {
        let document = document()
            .with_object_class(ObjectClassDef::new("jansClnt").with_parent("missingParent"));
        let err = plan(document, DialectKind::Mysql).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UndefinedParent { ref parent, .. } if parent == "missingParent"
        ));
    }

    #[test]
    fn test_undefined_merge_is_fatal() {
        let document =
            document().with_object_class(ObjectClassDef::new("jansClnt").with_merge("nowhere"));
        assert!(matches!(
            plan(document, DialectKind::Pgsql),
            Err(ConfigError::UndefinedMerge { .. })
        ));
    }

    #[test]
    fn test_aliases_collapse_to_one_column() {
        let document = SchemaDocument::new()
            .with_attribute(AttributeDef::new("uid", STRING).with_alias("userid").sized(64))
            .with_object_class(ObjectClassDef::new("person").with_may(["userid", "cn"]))
            .with_object_class(
                ObjectClassDef::new("gluuPerson")
                    .with_parent("person")
                    .with_may(["uid"]),
            );
        let tables = plan(document, DialectKind::Mysql).unwrap();

        let person = tables.iter().find(|t| t.name == "person").unwrap();
        assert_eq!(person.column_names(), vec!["doc_id", "objectClass", "dn", "uid", "cn"]);

        let gluu = tables.iter().find(|t| t.name == "gluuPerson").unwrap();
        assert_eq!(gluu.column_names(), vec!["doc_id", "objectClass", "dn", "uid", "cn"]);
        assert_eq!(gluu.column("uid").unwrap().column_type, ColumnType::Varchar(64));
    }

    #[test]
    fn test_planning_is_pure() {
        let first = plan(document(), DialectKind::Spanner).unwrap();
        let second = plan(document(), DialectKind::Spanner).unwrap();
        assert_eq!(first, second);
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }
}
