//! The bootstrap pipeline: plan, materialize, index.

use crate::audit::StatementLog;
use crate::config::SchemaCompilerConfig;
use crate::dialect::ServerVersion;
use crate::error::{ConfigError, Result};
use crate::executor::DdlExecutor;
use crate::plan::{
    plan_subtables, plan_tables, IndexPlanner, SchemaPlan, SubtableDefinition, TableDefinition,
};
use crate::policy::IndexPolicy;
use crate::schema::DirectorySchema;
use crate::session::Session;
use crate::statement::Statement;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Tables and subtables known to exist after materialization.
#[derive(Debug, Clone, Default)]
pub struct MaterializedSchema {
    /// Planned tables, all present in the catalog.
    pub tables: Vec<TableDefinition>,
    /// Planned subtables, all present in the catalog.
    pub subtables: Vec<SubtableDefinition>,
    /// Tables and subtables created by this run.
    pub created_tables: Vec<String>,
    /// `(table, column)` pairs added to existing tables by this run.
    pub added_columns: Vec<(String, String)>,
}

/// What the index stage did.
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    /// Indexes created by this run.
    pub created: Vec<String>,
    /// Shadow columns added by this run.
    pub shadow_columns: Vec<String>,
    /// Planned statements skipped because their object already existed.
    pub skipped: usize,
}

/// Outcome of a full bootstrap.
#[derive(Debug, Clone, Default)]
pub struct BootstrapReport {
    /// Output of the materialize stage.
    pub schema: MaterializedSchema,
    /// Output of the index stage.
    pub indexes: IndexReport,
    /// Statements issued, including failed ones.
    pub statements: usize,
}

/// Compiles a directory schema into SQL and applies it.
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    config: SchemaCompilerConfig,
    schema: DirectorySchema,
    index_policy: IndexPolicy,
}

impl SchemaCompiler {
    /// Create a compiler from loaded documents.
    pub fn new(
        config: SchemaCompilerConfig,
        schema: DirectorySchema,
        index_policy: IndexPolicy,
    ) -> Self {
        Self {
            config,
            schema,
            index_policy,
        }
    }

    /// Load schema documents in order, plus the index policy.
    pub fn from_paths<I, P>(
        config: SchemaCompilerConfig,
        schema_paths: I,
        index_policy: impl AsRef<Path>,
    ) -> std::result::Result<Self, ConfigError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let schema = DirectorySchema::from_paths(schema_paths)?;
        let index_policy = IndexPolicy::from_path(index_policy)?;
        Ok(Self::new(config, schema, index_policy))
    }

    /// Use `version` as the server version, e.g. one detected from the session.
    pub fn with_server_version(mut self, version: ServerVersion) -> Self {
        self.config.server_version = Some(version);
        self
    }

    /// The compiler configuration.
    pub fn config(&self) -> &SchemaCompilerConfig {
        &self.config
    }

    /// The merged directory schema.
    pub fn schema(&self) -> &DirectorySchema {
        &self.schema
    }

    /// Plan tables and subtables.
    ///
    /// Every configuration error surfaces here, before any statement is issued.
    pub fn plan(&self) -> std::result::Result<SchemaPlan, ConfigError> {
        let tables = plan_tables(&self.schema, &self.config)?;
        let subtables = plan_subtables(&self.schema, &self.config, &tables)?;
        Ok(SchemaPlan { tables, subtables })
    }

    /// Create missing tables and columns, then missing subtables.
    #[instrument(skip_all, fields(dialect = %self.config.dialect))]
    pub fn materialize<S: Session + ?Sized>(
        &self,
        plan: &SchemaPlan,
        executor: &mut DdlExecutor<'_, S>,
    ) -> Result<MaterializedSchema> {
        let dialect = *executor.dialect();
        let mut materialized = MaterializedSchema::default();

        for table in &plan.tables {
            let create = table.to_create(&dialect, &self.config.person_table);
            if executor.create_table_if_absent(create)? {
                materialized.created_tables.push(table.name.clone());
            } else {
                let existing: HashSet<String> = executor
                    .table_columns(&table.name)?
                    .into_iter()
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                for column in &table.columns {
                    if existing.contains(&column.name.to_ascii_lowercase()) {
                        continue;
                    }
                    executor.add_column(&table.name, column.to_def())?;
                    materialized
                        .added_columns
                        .push((table.name.clone(), column.name.clone()));
                }
            }
            materialized.tables.push(table.clone());
        }

        for subtable in &plan.subtables {
            let name = subtable.name();
            if executor.create_table_if_absent(subtable.to_create())? {
                let index = subtable.to_index(&dialect, self.config.text_index_prefix);
                executor.create_index_if_absent(index)?;
                materialized.created_tables.push(name);
            } else if !executor.column_exists(&name, &subtable.attribute)? {
                executor.add_column(&name, subtable.value_column().to_def())?;
                materialized
                    .added_columns
                    .push((name, subtable.attribute.clone()));
            } else {
                debug!(subtable = %name, "Subtable up to date");
            }
            materialized.subtables.push(subtable.clone());
        }

        info!(
            created = materialized.created_tables.len(),
            added_columns = materialized.added_columns.len(),
            "Materialized tables"
        );
        Ok(materialized)
    }

    /// Create the indexes the policy selects for materialized tables.
    #[instrument(skip_all, fields(dialect = %self.config.dialect))]
    pub fn index<S: Session + ?Sized>(
        &self,
        materialized: &MaterializedSchema,
        executor: &mut DdlExecutor<'_, S>,
    ) -> Result<IndexReport> {
        let planner = IndexPlanner::new(&self.schema, &self.config, &self.index_policy);
        let mut report = IndexReport::default();

        for statement in planner.plan(&materialized.tables) {
            let label = match &statement {
                Statement::AddColumn(add) => Some(add.column.name.clone()),
                _ => None,
            };
            let name = match &statement {
                Statement::CreateIndex(index) => {
                    Some(executor.dialect().fit_identifier(&index.name))
                }
                _ => None,
            };
            if !executor.apply_if_absent(statement)? {
                report.skipped += 1;
                continue;
            }
            report.shadow_columns.extend(label);
            report.created.extend(name);
        }

        info!(
            created = report.created.len(),
            shadow_columns = report.shadow_columns.len(),
            skipped = report.skipped,
            "Applied indexes"
        );
        Ok(report)
    }

    /// Run all three stages against `session`, logging every statement to `log`.
    pub fn bootstrap<S: Session + ?Sized>(
        &self,
        session: &mut S,
        log: &dyn StatementLog,
    ) -> Result<BootstrapReport> {
        let plan = self.plan()?;
        let mut executor = DdlExecutor::new(session, log, self.config.adapter());

        let schema = self.materialize(&plan, &mut executor)?;
        let indexes = self.index(&schema, &mut executor)?;
        log.flush()?;

        Ok(BootstrapReport {
            schema,
            indexes,
            statements: executor.issued(),
        })
    }
}
