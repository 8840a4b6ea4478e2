pub mod classify;
pub mod cli;
pub mod driver;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod sequences;
pub mod stats;
pub mod store;
pub mod type_table;
pub mod types;

use std::{env, fs, io::Write, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde::Serialize;

use crate::{
    cli::{Cli, Commands, OutputFormat, StoreKind},
    driver::{ReconcileRequest, Reconciler},
    store::StoreAccessor,
    type_table::TypeTable,
    types::FieldDescriptor,
};

pub use driver::ReconciliationReport;
pub use error::ReconcileError;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("store_reconcile", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

/// Parses the command line and runs it. `Ok(false)` means the stores diverge.
pub fn run() -> Result<bool> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Check(args) => handle_check(&args),
        Commands::Describe(args) => handle_describe(&args).map(|()| true),
    }
}

fn load_type_table(path: Option<&Path>) -> Result<TypeTable> {
    match path {
        Some(path) => {
            let table = TypeTable::load(path)?;
            debug!(
                "Type table from {:?}: {} spelling(s), {} near pair(s)",
                path,
                table.spellings().len(),
                table.near_pairs().len()
            );
            Ok(table)
        }
        None => Ok(TypeTable::default()),
    }
}

fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("Serializing report as JSON")
        }
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Serializing report as YAML"),
    }
}

fn handle_check(args: &cli::CheckArgs) -> Result<bool> {
    info!(
        "Checking legacy table '{}' in {:?} against columnar field set '{}' in {:?}",
        args.legacy_table, args.legacy, args.columnar_name, args.columnar
    );
    let table = load_type_table(args.type_table.as_deref())?;
    let request = ReconcileRequest {
        legacy_path: args.legacy.clone(),
        legacy_table: args.legacy_table.clone(),
        columnar_path: args.columnar.clone(),
        columnar_name: args.columnar_name.clone(),
    };
    let report = Reconciler::open(&request, table)
        .and_then(Reconciler::run)
        .with_context(|| format!("Reconciling {:?} against {:?}", args.legacy, args.columnar))?;
    let rendered = render(&report, args.format)?;
    match &args.output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("Writing report to {path:?}"))?;
            info!("Report written to {path:?}");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", rendered.trim_end()).context("Writing report to stdout")?;
        }
    }
    let consistent = report.is_consistent();
    if consistent {
        info!("Stores are consistent");
    } else {
        info!("Stores diverge");
    }
    Ok(consistent)
}

#[derive(Debug, Serialize)]
struct StoreDescription<'a> {
    origin: types::Origin,
    location: &'a str,
    object_name: &'a str,
    entries: u64,
    fields: Vec<FieldDescriptor>,
    private_fields: Vec<&'a str>,
}

fn handle_describe(args: &cli::DescribeArgs) -> Result<()> {
    let table = load_type_table(args.type_table.as_deref())?;
    let accessor: Box<dyn StoreAccessor> = match args.store {
        StoreKind::Legacy => store::open_legacy(&args.input, &args.name)?,
        StoreKind::Columnar => store::open_columnar(&args.input, &args.name)?,
    };
    let description = StoreDescription {
        origin: accessor.origin(),
        location: accessor.location(),
        object_name: accessor.object_name(),
        entries: accessor.entry_count(),
        fields: store::describe(accessor.as_ref(), &table)?,
        private_fields: accessor.private_fields(),
    };
    println!("{}", render(&description, OutputFormat::Json)?);
    info!(
        "Described {} field(s) of {} store '{}'",
        description.fields.len(),
        description.origin,
        description.object_name
    );
    Ok(())
}
