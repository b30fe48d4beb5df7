//! dirsql command-line front end.
//!
//! Plans, prints and applies the SQL schema compiled from directory schema
//! documents.

mod config;

use clap::Parser;
use config::{Args, Command, OutputFormat};
use dirsql_core::{
    FileStatementLog, MemorySession, MemoryStatementLog, SchemaCompiler, SchemaCompilerConfig,
    StatementLog,
};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = SchemaCompilerConfig::try_from(&args)?;
    let compiler = SchemaCompiler::from_paths(config, &args.schemas, &args.index_policy)?;
    info!(dialect = %compiler.config().dialect, "Loaded schema");

    match args.command {
        Command::Plan { existing, log } => plan(&compiler, existing.as_deref(), log.as_deref()),
        Command::Tables { format } => tables(&compiler, format),
        #[cfg(any(feature = "postgres", feature = "mysql"))]
        Command::Apply { database_url, log } => apply(compiler, &database_url, &log),
    }
}

/// Print the statements a bootstrap would issue against `existing`.
fn plan(
    compiler: &SchemaCompiler,
    existing: Option<&Path>,
    log_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = MemorySession::new();
    if let Some(path) = existing {
        let catalog: BTreeMap<String, Vec<String>> =
            serde_json::from_str(&std::fs::read_to_string(path)?)?;
        for (table, columns) in catalog {
            session = session.with_table(table, columns);
        }
    }

    let log = MemoryStatementLog::new();
    compiler.bootstrap(&mut session, &log)?;

    let file = log_path.map(FileStatementLog::open).transpose()?;
    for line in log.lines() {
        println!("{line};");
        if let Some(file) = &file {
            file.record(&line)?;
        }
    }
    if let Some(file) = &file {
        file.flush()?;
    }
    Ok(())
}

/// Print planned tables and subtables.
fn tables(compiler: &SchemaCompiler, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let plan = compiler.plan()?;
    let dialect = compiler.config().adapter();

    match format {
        OutputFormat::Text => {
            for table in &plan.tables {
                println!("{}", table.name);
                for column in &table.columns {
                    println!("  {} {}", column.name, dialect.render_type(&column.column_type));
                }
            }
            for subtable in &plan.subtables {
                println!("{} (subtable of {})", subtable.name(), subtable.parent);
                for column in subtable.columns() {
                    println!("  {} {}", column.name, dialect.render_type(&column.column_type));
                }
            }
        }
        OutputFormat::Json => {
            let columns = |columns: &[dirsql_core::plan::Column]| {
                columns
                    .iter()
                    .map(|c| {
                        serde_json::json!({
                            "name": c.name,
                            "type": dialect.render_type(&c.column_type),
                        })
                    })
                    .collect::<Vec<_>>()
            };
            let document = serde_json::json!({
                "dialect": compiler.config().dialect.to_string(),
                "tables": plan.tables.iter().map(|t| serde_json::json!({
                    "name": t.name,
                    "columns": columns(&t.columns),
                })).collect::<Vec<_>>(),
                "subtables": plan.subtables.iter().map(|s| serde_json::json!({
                    "name": s.name(),
                    "parent": s.parent,
                    "columns": columns(&s.columns()),
                })).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }
    Ok(())
}

/// Run the bootstrap against a live database.
#[cfg(any(feature = "postgres", feature = "mysql"))]
fn apply(
    mut compiler: SchemaCompiler,
    database_url: &str,
    log_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    use dirsql_core::{DialectKind, Session};

    let mut session: Box<dyn Session> = match compiler.config().dialect {
        #[cfg(feature = "mysql")]
        DialectKind::Mysql => Box::new(dirsql_core::MySqlSession::connect(database_url)?),
        #[cfg(feature = "postgres")]
        DialectKind::Pgsql => Box::new(dirsql_core::PgSession::connect(database_url)?),
        other => return Err(format!("no {other} session support in this build").into()),
    };

    if compiler.config().server_version.is_none() {
        if let Some(version) = session.server_version()? {
            info!(%version, "Detected server version");
            compiler = compiler.with_server_version(version);
        }
    }

    let log = FileStatementLog::open(log_path)?;
    let report = compiler.bootstrap(session.as_mut(), &log)?;
    info!(
        statements = report.statements,
        tables = report.schema.created_tables.len(),
        indexes = report.indexes.created.len(),
        "Bootstrap complete"
    );
    println!(
        "{} statements issued, logged to {}",
        report.statements,
        log.path().display()
    );
    Ok(())
}
