use std::path::PathBuf;

use anyhow::{anyhow, Context};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use mantis_core::config::CliOverrides;
use mantis_core::tracing::init_tracing;
use mantis_core::types::time::from_micros;
use mantis_core::{MantisConfig, MantisErrorCode};
use mantis_import::marking::{create_marking, load_marking, parse_pfill};
use mantis_import::ImportOptions;
use mantis_iodef::{set_naming, IodefImporter};
use mantis_storage::counts::object_counts;
use mantis_storage::queries::{import_history, iobjects};
use mantis_storage::DatabaseManager;

#[derive(Parser)]
#[command(author, version, about = "Import IODEF (RFC 5070) documents into a Mantis store", long_about = None)]
struct Cli {
    /// Database file. Overrides `storage.database_path`.
    #[arg(long, value_name = "FILE", global = true)]
    db: Option<PathBuf>,

    /// Directory holding `mantis.toml`. Defaults to the current directory.
    #[arg(long, value_name = "DIR", global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct ImportOpt {
    /// IODEF files to import
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// JSON marking definition; the marking is stored and attached to every imported object
    #[arg(long, value_name = "FILE")]
    marking_json: Option<PathBuf>,

    /// Placeholder value for the marking definition, as KEY=VALUE
    #[arg(long, value_name = "KEY=VALUE", requires = "marking_json")]
    marking_pfill: Vec<String>,

    /// Id of an existing marking object to attach, in addition to the configured defaults (repeatable)
    #[arg(long = "marking", value_name = "ID")]
    markings: Vec<i64>,

    /// Identifier namespace for incidents without an IncidentID name
    #[arg(long, value_name = "URI")]
    identifier_ns_uri: Option<String>,
}

#[derive(Debug, Args)]
struct ListOpt {
    /// Number of rows to show
    #[arg(short, long, default_value_t = 20)]
    limit: usize,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import IODEF files
    Import(ImportOpt),
    /// Install the IODEF naming schemas and rename stored objects
    SetNaming,
    /// Show row counts per model
    Stats,
    /// Show recent import runs
    History(ListOpt),
    /// Show recently stored objects
    Objects(ListOpt),
}

fn open_db(config: &MantisConfig) -> anyhow::Result<DatabaseManager> {
    let path = PathBuf::from(config.storage.effective_database_path());
    DatabaseManager::open_with_pool_size(&path, config.storage.effective_read_pool_size())
        .with_context(|| format!("opening database {}", path.display()))
}

impl Command {
    fn import(o: ImportOpt, config: &MantisConfig) -> anyhow::Result<()> {
        let db = open_db(config)?;
        let mut options = ImportOptions::from_config(&config.import);
        options.create_timestamp = Some(Utc::now());

        if let Some(path) = &o.marking_json {
            let pfill = o
                .marking_pfill
                .iter()
                .map(|pair| parse_pfill(pair))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| anyhow!(e.coded_string()))?;
            let marking = load_marking(path, &pfill).map_err(|e| anyhow!(e.coded_string()))?;
            let outcome = create_marking(&db, &marking, Utc::now())
                .map_err(|e| anyhow!(e.coded_string()))?;
            println!(
                "marking {} ({}): {}",
                marking.identifier,
                outcome.iobject_id(),
                outcome.as_str()
            );
            options.markings.push(outcome.iobject_id());
        }

        let importer = IodefImporter::from_config(&db, &config.import);
        let run = importer.import_files(&o.files, &options);

        for summary in &run.data {
            println!(
                "{}: {} created, {} unchanged, {} replaced, {} skipped",
                summary.source,
                summary.created(),
                summary.unchanged(),
                summary.replaced(),
                summary.skipped()
            );
        }
        for (source, error) in &run.errors {
            eprintln!("{source}: {}", error.coded_string());
        }

        if run.is_clean() {
            Ok(())
        } else {
            Err(anyhow!(
                "{} of {} files failed to import",
                run.error_count(),
                o.files.len()
            ))
        }
    }

    fn set_naming(config: &MantisConfig) -> anyhow::Result<()> {
        let db = open_db(config)?;
        let renamed = set_naming(&db).map_err(|e| anyhow!(e.coded_string()))?;
        println!("naming schemas installed, {renamed} objects renamed");
        Ok(())
    }

    fn stats(config: &MantisConfig) -> anyhow::Result<()> {
        let db = open_db(config)?;
        let counts = db
            .with_reader(object_counts)
            .map_err(|e| anyhow!(e.coded_string()))?;
        for (model, count) in counts {
            println!("{model:<20} {count}");
        }
        Ok(())
    }

    fn history(o: ListOpt, config: &MantisConfig) -> anyhow::Result<()> {
        let db = open_db(config)?;
        let rows = db
            .with_reader(|conn| import_history::query_recent(conn, o.limit))
            .map_err(|e| anyhow!(e.coded_string()))?;
        for row in rows {
            let counts = match (row.created_objects, row.unchanged_objects, row.replaced_objects) {
                (Some(c), Some(u), Some(r)) => format!("{c}/{u}/{r}"),
                _ => "-".to_string(),
            };
            println!(
                "{:>5} {} {:<9} {:<9} {}{}",
                row.id,
                from_micros(row.started_at).to_rfc3339(),
                row.status,
                counts,
                row.source,
                row.error.map(|e| format!("  {e}")).unwrap_or_default()
            );
        }
        Ok(())
    }

    fn objects(o: ListOpt, config: &MantisConfig) -> anyhow::Result<()> {
        let db = open_db(config)?;
        let rows = db
            .with_reader(|conn| iobjects::list_recent(conn, o.limit))
            .map_err(|e| anyhow!(e.coded_string()))?;
        for row in rows {
            println!(
                "{:>5} {}{} {}/{} {} {}",
                row.id,
                if row.is_latest { "*" } else { " " },
                row.identifier,
                row.family,
                row.type_name,
                from_micros(row.timestamp).to_rfc3339(),
                row.name
            );
        }
        Ok(())
    }
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let mut overrides = CliOverrides {
        database_path: cli.db.as_ref().map(|p| p.display().to_string()),
        ..Default::default()
    };
    if let Command::Import(o) = &cli.command {
        overrides.identifier_ns_uri = o.identifier_ns_uri.clone();
        overrides.markings = o.markings.clone();
    }

    let root = match cli.config {
        Some(dir) => dir,
        None => std::env::current_dir().context("resolving current directory")?,
    };
    let config = MantisConfig::load(&root, Some(&overrides)).map_err(|e| anyhow!(e.coded_string()))?;
    init_tracing(config.logging.effective_filter());

    match cli.command {
        Command::Import(o) => Command::import(o, &config),
        Command::SetNaming => Command::set_naming(&config),
        Command::Stats => Command::stats(&config),
        Command::History(o) => Command::history(o, &config),
        Command::Objects(o) => Command::objects(o, &config),
    }
}
