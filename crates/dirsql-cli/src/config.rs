//! Command line arguments.

use clap::{Parser, Subcommand, ValueEnum};
use dirsql_core::{ConfigError, DialectKind, SchemaCompilerConfig, ServerVersion};
use std::path::PathBuf;

/// dirsql command line arguments.
#[derive(Debug, Parser)]
#[command(name = "dirsql")]
#[command(version, about = "Compile directory schemas into SQL tables and indexes")]
pub struct Args {
    /// Schema document; repeat to merge several in order.
    #[arg(short, long = "schema", required = true)]
    pub schemas: Vec<PathBuf>,

    /// Index policy document.
    #[arg(short, long)]
    pub index_policy: PathBuf,

    /// Compiler configuration document.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Target dialect (mysql, pgsql or spanner); overrides the configuration.
    #[arg(short, long)]
    pub dialect: Option<DialectKind>,

    /// Server version, e.g. 8.0.30; overrides the configuration.
    #[arg(long)]
    pub server_version: Option<ServerVersion>,

    /// Table whose uid column must be unique; overrides the configuration.
    #[arg(long)]
    pub person_table: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the DDL a bootstrap would issue.
    Plan {
        /// JSON object mapping existing table names to their column names.
        #[arg(long)]
        existing: Option<PathBuf>,

        /// Also append the statements to this log file.
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Print the planned tables and subtables.
    Tables {
        /// Output format.
        #[arg(long, default_value = "text", value_enum)]
        format: OutputFormat,
    },

    /// Apply the schema to a live database.
    #[cfg(any(feature = "postgres", feature = "mysql"))]
    Apply {
        /// Database connection URL.
        #[arg(long)]
        database_url: String,

        /// Append-only statement log.
        #[arg(long, default_value = "dirsql-ddl.log")]
        log: PathBuf,
    },
}

/// Output format for `tables`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One table per block, one column per line.
    Text,
    /// JSON document.
    Json,
}

impl TryFrom<&Args> for SchemaCompilerConfig {
    type Error = ConfigError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let mut config = match &args.config {
            Some(path) => SchemaCompilerConfig::from_path(path)?,
            None => SchemaCompilerConfig::default(),
        };
        if let Some(dialect) = args.dialect {
            config.dialect = dialect;
        }
        if let Some(version) = args.server_version {
            config.server_version = Some(version);
        }
        if let Some(table) = &args.person_table {
            config.person_table = table.clone();
        }
        Ok(config)
    }
}
