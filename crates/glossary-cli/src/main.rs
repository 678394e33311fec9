//! Glossary CLI
//!
//! Drives the sync engine against a snapshot file:
//! - `load` a dataset into the store (and save it)
//! - `dump` the store back to a dataset
//! - `export-columns` / `export-json` for downstream tools
//! - `stats` and `clear` for housekeeping
//!
//! Exit codes: 0 success, 1 fatal error (malformed input, unreadable or
//! unwritable files, bad snapshot), 2 load finished with rolled-back records
//! (or, with `--strict`, with any warning).

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use glossary_graph::{EntityKind, GraphStore, MemoryStore, RelationKind};
use glossary_sync::{LoadReport, SyncConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "glossary")]
#[command(author, version, about = "Business glossary: bulk load, reconcile and dump")]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Snapshot file holding the glossary graph
    #[arg(long, env = "GLOSSARY_DB", default_value = "glossary.gldb", global = true)]
    db: PathBuf,

    /// YAML file with sync settings (auto_create, wrap_width, empty_markers)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Kinds that may be stub-created for dangling references (comma separated)
    #[arg(long, value_delimiter = ',', global = true, conflicts_with = "no_auto_create")]
    auto_create: Option<Vec<String>>,

    /// Never create stub nodes
    #[arg(long, global = true)]
    no_auto_create: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a dataset file into the store
    Load {
        /// Dataset file (YAML sections)
        input: PathBuf,
        /// Print the load report as JSON on stdout
        #[arg(long)]
        json_report: bool,
        /// Exit with status 2 when the load produced any warning
        #[arg(long)]
        strict: bool,
        /// Report what would happen without saving the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Dump the store to a dataset file
    Dump {
        /// Output file
        output: PathBuf,
    },

    /// Export term/column associations as CSV (term, table, column)
    ExportColumns {
        output: PathBuf,
    },

    /// Export terms with their categories, links, columns and rules as JSON
    ExportJson {
        output: PathBuf,
    },

    /// Print node and edge counts
    Stats,

    /// Reset the store to empty
    Clear,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "glossary=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config = sync_config(&cli.store)?;
    let db = cli.store.db.as_path();

    match cli.command {
        Commands::Load {
            input,
            json_report,
            strict,
            dry_run,
        } => cmd_load(db, &config, &input, json_report, strict, dry_run),
        Commands::Dump { output } => {
            let store = open_store(db)?;
            let summary = glossary_sync::dump_path(&store, &output, &config)
                .with_context(|| format!("dumping to {}", output.display()))?;
            eprintln!(
                "{} {} ({} records, sha256 {})",
                "wrote".green().bold(),
                output.display().to_string().bold(),
                summary.records(),
                &summary.sha256[..12]
            );
            Ok(0)
        }
        Commands::ExportColumns { output } => {
            let store = open_store(db)?;
            let rows = glossary_sync::export_columns_path(&store, &output)
                .with_context(|| format!("exporting columns to {}", output.display()))?;
            eprintln!(
                "{} {} ({rows} rows)",
                "wrote".green().bold(),
                output.display().to_string().bold()
            );
            Ok(0)
        }
        Commands::ExportJson { output } => {
            let store = open_store(db)?;
            let terms = glossary_sync::export_terms_path(&store, &output)
                .with_context(|| format!("exporting terms to {}", output.display()))?;
            eprintln!(
                "{} {} ({terms} terms)",
                "wrote".green().bold(),
                output.display().to_string().bold()
            );
            Ok(0)
        }
        Commands::Stats => {
            let store = open_store(db)?;
            print_stats(&store);
            Ok(0)
        }
        Commands::Clear => {
            MemoryStore::new()
                .save(db)
                .with_context(|| format!("writing {}", db.display()))?;
            eprintln!("{} {}", "cleared".green().bold(), db.display());
            Ok(0)
        }
    }
}

fn sync_config(args: &StoreArgs) -> Result<SyncConfig> {
    let mut config = match &args.config {
        Some(path) => SyncConfig::from_path(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => SyncConfig::default(),
    };

    if args.no_auto_create {
        config = config.without_auto_create();
    } else if let Some(kinds) = &args.auto_create {
        config.auto_create = kinds
            .iter()
            .map(|name| {
                EntityKind::parse(name.trim())
                    .with_context(|| format!("unknown kind `{name}` in --auto-create"))
            })
            .collect::<Result<_>>()?;
    }
    Ok(config)
}

fn open_store(db: &Path) -> Result<MemoryStore> {
    MemoryStore::open_or_new(db).with_context(|| format!("opening store {}", db.display()))
}

fn cmd_load(
    db: &Path,
    config: &SyncConfig,
    input: &Path,
    json_report: bool,
    strict: bool,
    dry_run: bool,
) -> Result<i32> {
    let mut store = open_store(db)?;
    let report = glossary_sync::load_path(&mut store, input, config)
        .with_context(|| format!("loading {}", input.display()))?;

    if !dry_run {
        store
            .save(db)
            .with_context(|| format!("writing {}", db.display()))?;
    }

    if json_report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, input);
    }

    let failed = report.total_store_errors() > 0 || (strict && !report.warnings.is_empty());
    Ok(if failed { 2 } else { 0 })
}

fn print_report(report: &LoadReport, input: &Path) {
    println!(
        "{} {}",
        "Loaded".green().bold(),
        input.display().to_string().bold()
    );
    println!("{report}");
    for warning in &report.warnings {
        println!("  {} {warning}", "warn".yellow());
    }
}

fn print_stats(store: &MemoryStore) {
    println!("{}", "nodes".bold());
    for kind in EntityKind::ALL {
        let count = store.node_count(kind);
        if count > 0 {
            println!("  {:<14} {count}", kind.as_str());
        }
    }
    println!("{}", "edges".bold());
    for relation in RelationKind::ALL {
        let count = store.edge_count(relation);
        if count > 0 {
            println!("  {:<14} {count}", relation.as_str());
        }
    }
    println!("{} nodes, {} edges", store.len(), store.total_edges());
}
