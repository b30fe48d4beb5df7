//! Subtable planning for multivalued attributes.

use super::{SubtableDefinition, TableDefinition, TypeMapper};
use crate::config::SchemaCompilerConfig;
use crate::error::ConfigError;
use crate::schema::DirectorySchema;
use tracing::debug;

/// Plan a subtable for every (table, attribute) pair routed to one.
///
/// Every routed table must be one of the planned `tables`.
pub fn plan_subtables(
    schema: &DirectorySchema,
    config: &SchemaCompilerConfig,
    tables: &[TableDefinition],
) -> Result<Vec<SubtableDefinition>, ConfigError> {
    let mapper = TypeMapper::new(schema, config);
    let mut subtables = Vec::new();

    for attribute in schema.attributes() {
        for parent in &attribute.subtables {
            if !tables.iter().any(|t| &t.name == parent) {
                return Err(ConfigError::UnknownSubtableParent {
                    attribute: attribute.name().to_string(),
                    table: parent.clone(),
                });
            }
            let subtable = SubtableDefinition {
                parent: parent.clone(),
                attribute: attribute.name().to_string(),
                value_type: mapper.resolve_scalar(attribute.name(), parent),
            };
            debug!(subtable = %subtable.name(), "Planned subtable");
            subtables.push(subtable);
        }
    }

    Ok(subtables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;
    use crate::plan::plan_tables;
    use crate::schema::{AttributeDef, ObjectClassDef, SchemaDocument};
    use crate::types::ColumnType;

    const STRING: &str = "1.3.6.1.4.1.1466.115.121.1.15";

    fn schema(parent: &str) -> DirectorySchema {
        DirectorySchema::from_documents([SchemaDocument::new()
            .with_attribute(AttributeDef::new("uid", STRING).sized(64))
            .with_attribute(
                AttributeDef::new("mail", STRING)
                    .sized(255)
                    .multivalued()
                    .with_subtable(parent),
            )
            .with_object_class(ObjectClassDef::new("gluuPerson").with_may(["uid", "mail"]))])
        .unwrap()
    }

    #[test]
    fn test_mail_subtable() {
        let schema = schema("gluuPerson");
        let config = SchemaCompilerConfig::new(DialectKind::Mysql);
        let tables = plan_tables(&schema, &config).unwrap();
        let subtables = plan_subtables(&schema, &config, &tables).unwrap();

        assert_eq!(subtables.len(), 1);
        let mail = &subtables[0];
        assert_eq!(mail.name(), "gluuPerson_mail");
        assert_eq!(mail.value_type, ColumnType::MediumText);
        let columns: Vec<_> = mail.columns().into_iter().map(|c| c.name).collect();
        assert_eq!(columns, vec!["doc_id", "dict_doc_id", "mail"]);
        assert_eq!(mail.to_create().primary_key, vec!["doc_id", "dict_doc_id"]);
    }

    #[test]
    fn test_unknown_parent_is_fatal() {
        let schema = schema("jansClnt");
        let config = SchemaCompilerConfig::new(DialectKind::Spanner);
        let tables = plan_tables(&schema, &config).unwrap();
        assert!(matches!(
            plan_subtables(&schema, &config, &tables),
            Err(ConfigError::UnknownSubtableParent { ref table, .. }) if table == "jansClnt"
        ));
    }
}
