//! SQL dialect policy and rendering.
//!
//! [`DialectAdapter`] is the single place that knows how a dialect quotes
//! identifiers, declares keys, and which JSON indexing strategy it can use.

use crate::error::ConfigError;
use crate::statement::{
    AddColumn, ColumnDef, CreateTable, IndexColumn, IndexKind, IndexSpec, IndexTarget, Statement,
};
use crate::types::ColumnType;
use serde::Deserialize;
use std::str::FromStr;

/// First MySQL release with multi-valued (functional JSON array) indexes.
pub const MYSQL_FUNCTIONAL_JSON_INDEX: ServerVersion = ServerVersion::new(8, 0, 17);

/// Hex digits of the hash suffix appended to shortened identifiers.
const IDENTIFIER_HASH_LEN: usize = 8;

/// Target backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// MySQL-like backend.
    Mysql,
    /// PostgreSQL-like backend.
    #[serde(alias = "postgres", alias = "postgresql", alias = "pg")]
    Pgsql,
    /// Strongly typed distributed SQL backend (Spanner).
    Spanner,
}

impl std::fmt::Display for DialectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialectKind::Mysql => write!(f, "mysql"),
            DialectKind::Pgsql => write!(f, "pgsql"),
            DialectKind::Spanner => write!(f, "spanner"),
        }
    }
}

impl FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(DialectKind::Mysql),
            "pgsql" | "postgres" | "postgresql" | "pg" => Ok(DialectKind::Pgsql),
            "spanner" => Ok(DialectKind::Spanner),
            other => Err(format!("unknown dialect: {other}")),
        }
    }
}

/// A `major.minor.patch` server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

impl ServerVersion {
    /// Create a version.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl std::fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ServerVersion {
    type Err = ConfigError;

    /// Parses strings such as `8.0.30`, `5.7` or `8.0.36-0ubuntu0.22.04.1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let numeric = s
            .trim()
            .split(|c: char| !(c.is_ascii_digit() || c == '.'))
            .next()
            .unwrap_or_default();

        let mut parts = numeric.split('.').filter(|p| !p.is_empty());
        let mut next = |required: bool| -> Result<u32, ConfigError> {
            match parts.next() {
                Some(part) => part
                    .parse()
                    .map_err(|_| ConfigError::InvalidVersion(s.to_string())),
                None if required => Err(ConfigError::InvalidVersion(s.to_string())),
                None => Ok(0),
            }
        };

        let major = next(true)?;
        let minor = next(false)?;
        let patch = next(false)?;
        Ok(ServerVersion::new(major, minor, patch))
    }
}

impl<'de> Deserialize<'de> for ServerVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// How JSON-capable columns get indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonIndexStrategy {
    /// One functional index per configured JSON-path template.
    Functional,
    /// Generated shadow columns over fixed array positions, each plainly indexed.
    ShadowColumns,
    /// JSON and array columns are left unindexed.
    Unsupported,
}

/// Dialect policy consulted by every planner stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectAdapter {
    kind: DialectKind,
    version: Option<ServerVersion>,
}

impl DialectAdapter {
    /// Create an adapter. An unknown version is assumed to be current.
    pub fn new(kind: DialectKind, version: Option<ServerVersion>) -> Self {
        Self { kind, version }
    }

    /// The dialect family.
    pub fn kind(&self) -> DialectKind {
        self.kind
    }

    /// The server version, if known.
    pub fn version(&self) -> Option<ServerVersion> {
        self.version
    }

    /// Quote an identifier.
    pub fn quote(&self, ident: &str) -> String {
        match self.kind {
            DialectKind::Mysql => format!("`{}`", ident.replace('`', "``")),
            DialectKind::Pgsql => format!("\"{}\"", ident.replace('"', "\"\"")),
            DialectKind::Spanner => ident.to_string(),
        }
    }

    /// Longest identifier the backend keeps intact.
    pub fn max_identifier_len(&self) -> usize {
        match self.kind {
            DialectKind::Mysql => 64,
            DialectKind::Pgsql => 63,
            DialectKind::Spanner => 128,
        }
    }

    /// Fit a generated identifier within [`Self::max_identifier_len`].
    ///
    /// Longer names are cut and suffixed with a hash of the full name, so the
    /// result is stable across runs and distinct names stay distinct.
    pub fn fit_identifier(&self, name: &str) -> String {
        let max = self.max_identifier_len();
        if name.len() <= max {
            return name.to_string();
        }
        let hash = blake3::hash(name.as_bytes()).to_hex();
        let mut cut = max - IDENTIFIER_HASH_LEN - 1;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}_{}", &name[..cut], &hash.as_str()[..IDENTIFIER_HASH_LEN])
    }

    /// Whether uniqueness can be declared inside `CREATE TABLE`.
    pub fn supports_inline_unique(&self) -> bool {
        !matches!(self.kind, DialectKind::Spanner)
    }

    /// How JSON-capable columns are indexed on this dialect.
    pub fn json_index_strategy(&self) -> JsonIndexStrategy {
        match self.kind {
            DialectKind::Pgsql => JsonIndexStrategy::Functional,
            DialectKind::Spanner => JsonIndexStrategy::Unsupported,
            DialectKind::Mysql => match self.version {
                Some(version) if version < MYSQL_FUNCTIONAL_JSON_INDEX => {
                    JsonIndexStrategy::ShadowColumns
                }
                _ => JsonIndexStrategy::Functional,
            },
        }
    }

    /// Whether text columns must be indexed by key prefix.
    pub fn requires_text_prefix(&self) -> bool {
        matches!(self.kind, DialectKind::Mysql)
    }

    /// Collection type for multivalued attributes stored inline.
    pub fn collection_type(&self, element: ColumnType) -> ColumnType {
        match self.kind {
            DialectKind::Spanner => ColumnType::Array(Box::new(element)),
            DialectKind::Mysql | DialectKind::Pgsql => ColumnType::Json,
        }
    }

    /// Render a column type.
    pub fn render_type(&self, column_type: &ColumnType) -> String {
        use ColumnType::*;
        match (self.kind, column_type) {
            (DialectKind::Spanner, Varchar(size)) => format!("STRING({size})"),
            (_, Varchar(size)) => format!("VARCHAR({size})"),
            (DialectKind::Mysql, MediumText) => "TINYTEXT".to_string(),
            (DialectKind::Spanner, MediumText | Text) => "STRING(MAX)".to_string(),
            (_, MediumText | Text) => "TEXT".to_string(),
            (DialectKind::Mysql, Boolean) => "SMALLINT".to_string(),
            (DialectKind::Pgsql, Boolean) => "BOOLEAN".to_string(),
            (DialectKind::Spanner, Boolean) => "BOOL".to_string(),
            (DialectKind::Spanner, Integer | BigInt) => "INT64".to_string(),
            (_, Integer) => "INT".to_string(),
            (_, BigInt) => "BIGINT".to_string(),
            (DialectKind::Pgsql, Json | Array(_)) => "JSONB".to_string(),
            (DialectKind::Mysql, Json | Array(_)) => "JSON".to_string(),
            (DialectKind::Spanner, Json) => "JSON".to_string(),
            (DialectKind::Spanner, Array(element)) => {
                format!("ARRAY<{}>", self.render_type(element))
            }
            (_, Other(sql)) => sql.clone(),
        }
    }

    /// Render any statement to SQL text.
    pub fn render(&self, statement: &Statement) -> String {
        match statement {
            Statement::CreateTable(create) => self.render_create_table(create),
            Statement::AddColumn(add) => self.render_add_column(add),
            Statement::CreateIndex(index) => self.render_create_index(index),
        }
    }

    fn render_column(&self, column: &ColumnDef) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote(&column.name),
            self.render_type(&column.column_type)
        );
        if let Some(expression) = &column.generated {
            sql.push_str(&format!(" GENERATED ALWAYS AS ({expression})"));
            if matches!(self.kind, DialectKind::Pgsql | DialectKind::Spanner) {
                sql.push_str(" STORED");
            }
        }
        if column.not_null {
            sql.push_str(" NOT NULL");
        }
        sql
    }

    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn render_create_table(&self, create: &CreateTable) -> String {
        let mut parts: Vec<String> = create
            .columns
            .iter()
            .map(|c| self.render_column(c))
            .collect();
        let primary_key = self.column_list(&create.primary_key);

        match self.kind {
            DialectKind::Spanner => {
                let mut sql = format!(
                    "CREATE TABLE {} ({}) PRIMARY KEY ({})",
                    self.quote(&create.name),
                    parts.join(", "),
                    primary_key
                );
                if let Some(parent) = &create.parent {
                    sql.push_str(&format!(
                        ", INTERLEAVE IN PARENT {} ON DELETE CASCADE",
                        self.quote(parent)
                    ));
                }
                sql
            }
            DialectKind::Mysql | DialectKind::Pgsql => {
                parts.push(format!("PRIMARY KEY ({primary_key})"));
                for column in &create.unique {
                    parts.push(format!("UNIQUE ({})", self.quote(column)));
                }
                if let Some(parent) = &create.parent {
                    let doc_id = self.quote(crate::plan::DOC_ID);
                    parts.push(format!(
                        "FOREIGN KEY ({doc_id}) REFERENCES {}({doc_id}) ON DELETE CASCADE",
                        self.quote(parent)
                    ));
                }
                format!(
                    "CREATE TABLE {} ({})",
                    self.quote(&create.name),
                    parts.join(", ")
                )
            }
        }
    }

    fn render_add_column(&self, add: &AddColumn) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote(&add.table),
            self.render_column(&add.column)
        )
    }

    fn render_index_column(&self, column: &IndexColumn) -> String {
        match column.prefix_len {
            Some(len) if self.requires_text_prefix() => {
                format!("{}({len})", self.quote(&column.name))
            }
            _ => self.quote(&column.name),
        }
    }

    fn render_create_index(&self, index: &IndexSpec) -> String {
        let head = match (index.kind, self.kind) {
            (IndexKind::Unique, DialectKind::Spanner) => "CREATE UNIQUE NULL_FILTERED INDEX",
            (IndexKind::Unique, _) => "CREATE UNIQUE INDEX",
            _ => "CREATE INDEX",
        };
        let key = match &index.target {
            IndexTarget::Columns(columns) => format!(
                "({})",
                columns
                    .iter()
                    .map(|c| self.render_index_column(c))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            IndexTarget::Expression(expression) => match (self.kind, index.kind) {
                (DialectKind::Spanner, _) => format!("({expression})"),
                (DialectKind::Pgsql, IndexKind::JsonPath) => format!(" USING GIN({expression})"),
                _ => format!("(({expression}))"),
            },
        };
        format!(
            "{head} {} ON {}{key}",
            self.quote(&self.fit_identifier(&index.name)),
            self.quote(&index.table)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{ColumnDef, CreateTable, IndexSpec};

    fn person_table() -> CreateTable {
        CreateTable::new("gluuPerson", vec!["doc_id".into()])
            .with_column(ColumnDef::new("doc_id", ColumnType::Varchar(64)).not_null())
            .with_column(ColumnDef::new("uid", ColumnType::Varchar(64)))
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!(
            "8.0.36-0ubuntu0.22.04.1".parse::<ServerVersion>().unwrap(),
            ServerVersion::new(8, 0, 36)
        );
        assert_eq!(
            "5.7".parse::<ServerVersion>().unwrap(),
            ServerVersion::new(5, 7, 0)
        );
        assert!("mysql".parse::<ServerVersion>().is_err());
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("postgres".parse::<DialectKind>().unwrap(), DialectKind::Pgsql);
        assert_eq!("Spanner".parse::<DialectKind>().unwrap(), DialectKind::Spanner);
        assert!("oracle".parse::<DialectKind>().is_err());
    }

    #[test]
    fn test_json_strategy_by_version() {
        let old = DialectAdapter::new(DialectKind::Mysql, Some(ServerVersion::new(5, 7, 40)));
        let new = DialectAdapter::new(DialectKind::Mysql, Some(MYSQL_FUNCTIONAL_JSON_INDEX));
        let unknown = DialectAdapter::new(DialectKind::Mysql, None);
        assert_eq!(old.json_index_strategy(), JsonIndexStrategy::ShadowColumns);
        assert_eq!(new.json_index_strategy(), JsonIndexStrategy::Functional);
        assert_eq!(unknown.json_index_strategy(), JsonIndexStrategy::Functional);
        assert_eq!(
            DialectAdapter::new(DialectKind::Spanner, None).json_index_strategy(),
            JsonIndexStrategy::Unsupported
        );
    }

    #[test]
    fn test_render_types() {
        let mysql = DialectAdapter::new(DialectKind::Mysql, None);
        let pg = DialectAdapter::new(DialectKind::Pgsql, None);
        let spanner = DialectAdapter::new(DialectKind::Spanner, None);

        assert_eq!(mysql.render_type(&ColumnType::MediumText), "TINYTEXT");
        assert_eq!(pg.render_type(&ColumnType::MediumText), "TEXT");
        assert_eq!(spanner.render_type(&ColumnType::Text), "STRING(MAX)");
        assert_eq!(spanner.render_type(&ColumnType::Varchar(64)), "STRING(64)");
        assert_eq!(pg.render_type(&ColumnType::Json), "JSONB");
        assert_eq!(
            spanner.render_type(&ColumnType::Array(Box::new(ColumnType::Varchar(64)))),
            "ARRAY<STRING(64)>"
        );
    }

    #[test]
    fn test_quoting() {
        assert_eq!(
            DialectAdapter::new(DialectKind::Mysql, None).quote("a`b"),
            "`a``b`"
        );
        assert_eq!(
            DialectAdapter::new(DialectKind::Pgsql, None).quote("dn"),
            "\"dn\""
        );
        assert_eq!(
            DialectAdapter::new(DialectKind::Spanner, None).quote("dn"),
            "dn"
        );
    }

    #[test]
    fn test_render_create_table_mysql() {
        let mysql = DialectAdapter::new(DialectKind::Mysql, None);
        let sql = mysql.render(&Statement::CreateTable(person_table().with_unique("uid")));
        assert_eq!(
            sql,
            "CREATE TABLE `gluuPerson` (`doc_id` VARCHAR(64) NOT NULL, `uid` VARCHAR(64), \
             PRIMARY KEY (`doc_id`), UNIQUE (`uid`))"
        );
    }

    #[test]
    fn test_render_interleaved_spanner_table() {
        let spanner = DialectAdapter::new(DialectKind::Spanner, None);
        let child = CreateTable::new("gluuPerson_mail", vec!["doc_id".into(), "dict_doc_id".into()])
            .with_column(ColumnDef::new("doc_id", ColumnType::Varchar(64)).not_null())
            .with_column(ColumnDef::new("dict_doc_id", ColumnType::Varchar(64)).not_null())
            .with_column(ColumnDef::new("mail", ColumnType::Text))
            .with_parent("gluuPerson");
        assert_eq!(
            spanner.render(&Statement::CreateTable(child)),
            "CREATE TABLE gluuPerson_mail (doc_id STRING(64) NOT NULL, dict_doc_id STRING(64) NOT NULL, \
             mail STRING(MAX)) PRIMARY KEY (doc_id, dict_doc_id), \
             INTERLEAVE IN PARENT gluuPerson ON DELETE CASCADE"
        );
    }

    #[test]
    fn test_render_indexes() {
        let spanner = DialectAdapter::new(DialectKind::Spanner, None);
        let unique = IndexSpec::unique("gluuPerson_unique_uuid", "gluuPerson", "uid");
        assert_eq!(
            spanner.render(&Statement::CreateIndex(unique)),
            "CREATE UNIQUE NULL_FILTERED INDEX gluuPerson_unique_uuid ON gluuPerson(uid)"
        );

        let mysql = DialectAdapter::new(DialectKind::Mysql, None);
        let prefixed = IndexSpec::plain(
            "jansPerson_descriptionIdx",
            "jansPerson",
            IndexColumn::prefix("description", 768),
        );
        assert_eq!(
            mysql.render(&Statement::CreateIndex(prefixed)),
            "CREATE INDEX `jansPerson_descriptionIdx` ON `jansPerson`(`description`(768))"
        );

        let pg = DialectAdapter::new(DialectKind::Pgsql, None);
        let json = IndexSpec::expression(
            "jansPerson_mail_json_1",
            "jansPerson",
            "\"mail\" jsonb_path_ops",
            IndexKind::JsonPath,
        );
        assert_eq!(
            pg.render(&Statement::CreateIndex(json)),
            "CREATE INDEX \"jansPerson_mail_json_1\" ON \"jansPerson\" USING GIN(\"mail\" jsonb_path_ops)"
        );
    }

    #[test]
    fn test_long_index_names_are_fitted() {
        let table = "jansUmaResourcePermission";
        let name = format!("{table}_jansUmaPermissionClaimsGatheringTicket_json_1");
        let other = format!("{table}_jansUmaPermissionClaimsGatheringTicket_json_2");

        for kind in [DialectKind::Mysql, DialectKind::Pgsql] {
            let dialect = DialectAdapter::new(kind, None);
            let fitted = dialect.fit_identifier(&name);
            assert_eq!(fitted.len(), dialect.max_identifier_len());
            assert!(fitted.starts_with("jansUmaResourcePermission_jansUmaPermission"));
            assert_eq!(fitted, dialect.fit_identifier(&name));
            assert_ne!(fitted, dialect.fit_identifier(&other));
            assert_eq!(dialect.fit_identifier(&fitted), fitted);

            let index = IndexSpec::plain(name.clone(), table, IndexColumn::new("jansTicket"));
            let sql = dialect.render(&Statement::CreateIndex(index));
            assert!(sql.contains(&dialect.quote(&fitted)));
        }

        let spanner = DialectAdapter::new(DialectKind::Spanner, None);
        assert_eq!(spanner.fit_identifier(&name), name);
        assert_eq!(
            DialectAdapter::new(DialectKind::Pgsql, None).fit_identifier("gluuPerson_uidIdx"),
            "gluuPerson_uidIdx"
        );
    }

    #[test]
    fn test_render_generated_column() {
        let mysql = DialectAdapter::new(DialectKind::Mysql, None);
        let add = AddColumn {
            table: "jansPerson".into(),
            column: ColumnDef::new("mail_mem_idx_0", ColumnType::Varchar(128))
                .generated("`mail`->>'$.v[0]'"),
        };
        assert_eq!(
            mysql.render(&Statement::AddColumn(add)),
            "ALTER TABLE `jansPerson` ADD COLUMN `mail_mem_idx_0` VARCHAR(128) \
             GENERATED ALWAYS AS (`mail`->>'$.v[0]')"
        );
    }
}
