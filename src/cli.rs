use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::region::RegionCode;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Enrich item lists with product, color, and cross-region item numbers",
    long_about = None
)]
pub struct Cli {
    /// YAML configuration file (built-in defaults when omitted)
    #[arg(long, global = true, env = "ITEM_LOOKUP_CONFIG")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the item library from the regional master files (reused when already present)
    Build(BuildArgs),
    /// Enrich an item list with library data
    Match(MatchArgs),
    /// Replace one region's master file and discard the persisted library
    UpdateRegion(UpdateRegionArgs),
    /// Show library state and whether the regional sources changed since it was built
    Status(StatusArgs),
    /// Preview the first few rows of a CSV or spreadsheet file
    Preview(PreviewArgs),
    /// Manage configuration files
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Merge the regional sources again even if a library exists
    #[arg(long)]
    pub rebuild: bool,
    /// Library file to read and write (overrides the configuration)
    #[arg(long)]
    pub library: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MatchArgs {
    /// Item list to enrich (CSV, TSV, or spreadsheet)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output file (stdout if omitted); `.xlsx` writes a workbook
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Region whose item numbers the key column holds (overrides the configuration)
    #[arg(long, value_parser = parse_region)]
    pub anchor: Option<RegionCode>,
    /// Library file to use (overrides the configuration)
    #[arg(long)]
    pub library: Option<PathBuf>,
    /// Render the first N enriched rows as a table on stdout
    #[arg(long)]
    pub preview: Option<usize>,
    /// CSV delimiter character for reading input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter to use for output (defaults from the output extension)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdateRegionArgs {
    /// Region whose master data is being replaced
    #[arg(long, value_parser = parse_region)]
    pub region: RegionCode,
    /// New master data file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Rebuild the library immediately after replacing the source
    #[arg(long)]
    pub build: bool,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Library file to inspect (overrides the configuration)
    #[arg(long)]
    pub library: Option<PathBuf>,
    /// Emit the status report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input file to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Worksheet to read (first sheet if omitted)
    #[arg(long)]
    pub sheet: Option<String>,
    /// Rows to skip above the header row
    #[arg(long = "header-row", default_value_t = 0)]
    pub header_row: usize,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding for input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration to a YAML file
    Init(ConfigInitArgs),
}

#[derive(Debug, Args)]
pub struct ConfigInitArgs {
    /// Destination YAML file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn parse_region(value: &str) -> Result<RegionCode, String> {
    value.parse()
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
