//! Index planning.

use super::{Column, TableDefinition, DOC_ID, UID};
use crate::config::SchemaCompilerConfig;
use crate::dialect::{DialectAdapter, DialectKind, JsonIndexStrategy};
use crate::policy::{DialectIndexPolicy, IndexPolicy, FIELD_PLACEHOLDER};
use crate::schema::DirectorySchema;
use crate::statement::{AddColumn, ColumnDef, IndexColumn, IndexKind, IndexSpec, Statement};
use crate::types::ColumnType;
use std::collections::HashSet;
use tracing::debug;

/// Key column for `column`, prefix-limited where the dialect requires it.
pub(crate) fn key_column(column: &Column, dialect: &DialectAdapter, text_prefix: u32) -> IndexColumn {
    if column.column_type.is_text() && dialect.requires_text_prefix() {
        IndexColumn::prefix(column.name.clone(), text_prefix)
    } else {
        IndexColumn::new(column.name.clone())
    }
}

/// Derives index statements for materialized tables.
///
/// Planning is pure; existence checks happen when statements are applied.
pub struct IndexPlanner<'a> {
    config: &'a SchemaCompilerConfig,
    policy: &'a DialectIndexPolicy,
    dialect: DialectAdapter,
    common_fields: HashSet<String>,
}

impl<'a> IndexPlanner<'a> {
    /// Create a planner for the configured dialect.
    ///
    /// The common field list is extended with every multivalued attribute the
    /// source directory itself indexes.
    pub fn new(
        schema: &DirectorySchema,
        config: &'a SchemaCompilerConfig,
        policy: &'a IndexPolicy,
    ) -> Self {
        let dialect = config.adapter();
        let policy = policy.for_dialect(dialect.kind());

        let mut common_fields: HashSet<String> = policy
            .common
            .fields
            .iter()
            .map(|f| f.to_ascii_lowercase())
            .collect();
        for attribute in &config.directory_indexed_attributes {
            if schema.is_multivalued(attribute) {
                common_fields.insert(attribute.to_ascii_lowercase());
            }
        }

        Self {
            config,
            policy,
            dialect,
            common_fields,
        }
    }

    /// Statements for every table, in table order.
    pub fn plan(&self, tables: &[TableDefinition]) -> Vec<Statement> {
        tables.iter().flat_map(|t| self.plan_table(t)).collect()
    }

    /// Statements for one table: column indexes, then custom, then uniqueness.
    pub fn plan_table(&self, table: &TableDefinition) -> Vec<Statement> {
        let mut statements = Vec::new();
        let fields = self.fields_for(&table.name);

        for column in &table.columns {
            if column.name == DOC_ID {
                continue;
            }
            let selected = fields.contains(&column.name.to_ascii_lowercase());

            if column.column_type.is_json_capable() {
                if selected {
                    self.plan_json(table, column, &mut statements);
                }
            } else if selected {
                let key = key_column(column, &self.dialect, self.config.text_index_prefix);
                statements.push(Statement::CreateIndex(IndexSpec::plain(
                    format!("{}_{}Idx", table.name, column.name),
                    table.name.clone(),
                    key,
                )));
            }
        }

        for (position, expression) in self.policy.custom(&table.name).iter().enumerate() {
            statements.push(Statement::CreateIndex(IndexSpec::expression(
                format!("{}_CustomIdx{}", table.name, position + 1),
                table.name.clone(),
                expression.clone(),
                IndexKind::Custom,
            )));
        }

        if self.dialect.kind() == DialectKind::Spanner && table.name == self.config.person_table {
            if let Some(uid) = table.column(UID) {
                statements.push(Statement::CreateIndex(IndexSpec::unique(
                    format!("{}_unique_uuid", table.name),
                    table.name.clone(),
                    uid.name.clone(),
                )));
            }
        }

        statements
    }

    fn fields_for(&self, table: &str) -> HashSet<String> {
        let mut fields = self.common_fields.clone();
        fields.extend(
            self.policy
                .table_fields(table)
                .iter()
                .map(|f| f.to_ascii_lowercase()),
        );
        fields
    }

    fn plan_json(&self, table: &TableDefinition, column: &Column, statements: &mut Vec<Statement>) {
        match self.dialect.json_index_strategy() {
            JsonIndexStrategy::Functional => {
                let quoted = self.dialect.quote(&column.name);
                for (position, template) in self.policy.common.json.iter().enumerate() {
                    statements.push(Statement::CreateIndex(IndexSpec::expression(
                        format!("{}_{}_json_{}", table.name, column.name, position + 1),
                        table.name.clone(),
                        template.replace(FIELD_PLACEHOLDER, &quoted),
                        IndexKind::JsonPath,
                    )));
                }
            }
            JsonIndexStrategy::ShadowColumns => {
                let quoted = self.dialect.quote(&column.name);
                for position in 0..self.config.shadow_positions {
                    let shadow = format!("{}_mem_idx_{position}", column.name);
                    let expression = format!(
                        "{quoted}->>'{}[{position}]'",
                        self.config.json_array_path
                    );
                    statements.push(Statement::AddColumn(AddColumn {
                        table: table.name.clone(),
                        column: ColumnDef::new(
                            shadow.clone(),
                            ColumnType::Varchar(self.config.shadow_column_size),
                        )
                        .generated(expression),
                    }));
                    statements.push(Statement::CreateIndex(IndexSpec::plain(
                        format!("{}_{shadow}", table.name),
                        table.name.clone(),
                        IndexColumn::new(shadow),
                    )));
                }
            }
            JsonIndexStrategy::Unsupported => {
                debug!(
                    table = %table.name,
                    column = %column.name,
                    "Leaving collection column unindexed"
                );
            }
        }
    }
}
