use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reconcile a legacy row store against its columnar migration",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare entries, fields, types and value statistics of both stores
    Check(CheckArgs),
    /// Print the entry count and field descriptors of a single store
    Describe(DescribeArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum StoreKind {
    Legacy,
    Columnar,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Legacy row store (YAML document or leaf-list CSV)
    #[arg(short = 't', long = "legacy")]
    pub legacy: PathBuf,
    /// Table to read from the legacy store
    #[arg(long = "legacy-table")]
    pub legacy_table: String,
    /// Columnar store (JSON document)
    #[arg(short = 'r', long = "columnar")]
    pub columnar: PathBuf,
    /// Field set to read from the columnar store
    #[arg(long = "columnar-name")]
    pub columnar_name: String,
    /// YAML file with extra type spellings and near-match pairs
    #[arg(long = "type-table")]
    pub type_table: Option<PathBuf>,
    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
    /// Write the report to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DescribeArgs {
    /// Which kind of store the input is
    #[arg(long = "store", value_enum)]
    pub store: StoreKind,
    /// Store file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Table (legacy) or field set (columnar) name
    #[arg(short = 'n', long = "name")]
    pub name: String,
    /// YAML file with extra type spellings and near-match pairs
    #[arg(long = "type-table")]
    pub type_table: Option<PathBuf>,
}
