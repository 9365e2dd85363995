pub mod cli;
pub mod columns;
pub mod config;
pub mod consistency;
pub mod error;
pub mod frame;
pub mod io_utils;
pub mod join;
pub mod library;
pub mod manifest;
pub mod matcher;
pub mod preview;
pub mod region;
pub mod repository;
pub mod status;
pub mod table;
pub mod tabular;
pub mod workbook;

use std::{env, fs, path::Path, sync::OnceLock};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, ConfigCommands},
    config::LookupConfig,
    library::{BuildOutcome, BuildPolicy, LibraryBuilder, LibraryOrigin},
    manifest::LibraryManifest,
    region::{FileSource, RegionSource},
    repository::{FileLibraryRepository, LibraryRepository},
    tabular::{ReadOptions, TableFormat},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("item_lookup", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = LookupConfig::load_or_default(cli.config.as_deref())?;
    debug!("Using data directory {:?}", config.data_dir);
    match cli.command {
        Commands::Build(args) => handle_build(&config, &args),
        Commands::Match(args) => handle_match(&config, &args),
        Commands::UpdateRegion(args) => handle_update_region(&config, &args),
        Commands::Status(args) => status::execute(&config, &args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Config(ConfigCommands::Init(args)) => handle_config_init(&args),
    }
}

fn repository_for(config: &LookupConfig, library: Option<&Path>) -> FileLibraryRepository {
    match library {
        Some(path) => FileLibraryRepository::new(path),
        None => config.repository(),
    }
}

/// Loads or builds the library and records a manifest for fresh builds.
fn ensure_library(
    config: &LookupConfig,
    repository: &FileLibraryRepository,
    policy: BuildPolicy,
) -> Result<BuildOutcome> {
    let builder = LibraryBuilder::new(config.region_sources());
    let outcome = builder
        .build(repository, policy)
        .with_context(|| format!("Preparing library {:?}", repository.path()))?;
    if let LibraryOrigin::Built(report) = &outcome.origin {
        let manifest = LibraryManifest::capture(report, &config.region_paths())?;
        manifest.save(repository.path())?;
    }
    Ok(outcome)
}

fn handle_build(config: &LookupConfig, args: &cli::BuildArgs) -> Result<()> {
    let repository = repository_for(config, args.library.as_deref());
    let policy = if args.rebuild {
        BuildPolicy::Rebuild
    } else {
        BuildPolicy::ReuseIfPresent
    };
    let outcome = ensure_library(config, &repository, policy)?;
    match outcome.origin {
        LibraryOrigin::Reused => info!(
            "Library {:?} already exists ({} row(s)); pass --rebuild to merge the sources again",
            repository.path(),
            outcome.library.len()
        ),
        LibraryOrigin::Built(report) => {
            let loaded = report
                .regions_loaded
                .iter()
                .map(|r| r.region.to_string())
                .collect::<Vec<_>>();
            info!(
                "Library {:?} ready: {} row(s), {} mismatch(es), regions [{}]",
                repository.path(),
                report.rows,
                report.mismatches,
                loaded.join(", ")
            );
        }
    }
    Ok(())
}

fn handle_match(config: &LookupConfig, args: &cli::MatchArgs) -> Result<()> {
    let repository = repository_for(config, args.library.as_deref());
    let library = ensure_library(config, &repository, BuildPolicy::ReuseIfPresent)?.library;

    let options = ReadOptions {
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
        ..ReadOptions::default()
    };
    let upload = matcher::read_upload(&args.input, &config.upload_layout(), &options)
        .with_context(|| format!("Reading upload {:?}", args.input))?;
    let anchor = args.anchor.unwrap_or(config.anchor);
    let outcome = config
        .matcher()
        .match_items(&upload, &library, anchor)
        .with_context(|| format!("Matching {:?}", args.input))?;

    if let Some(rows) = args.preview {
        table::print_frame(&outcome.table, Some(rows));
    }
    let to_stdout = args.output.as_deref().is_none_or(io_utils::is_dash);
    if !(to_stdout && args.preview.is_some()) {
        tabular::write_table(
            &outcome.table,
            args.output.as_deref(),
            args.output_delimiter,
        )?;
    }
    if let Some(output) = args.output.as_deref().filter(|p| !io_utils::is_dash(p)) {
        info!("Enriched {} row(s) written to {:?}", outcome.table.len(), output);
    }
    Ok(())
}

fn handle_update_region(config: &LookupConfig, args: &cli::UpdateRegionArgs) -> Result<()> {
    let region = config
        .region(args.region)
        .ok_or_else(|| anyhow!("Region {} is not configured", args.region))?;
    let target = config.resolve(&region.source);
    if TableFormat::from_path(&args.input) != TableFormat::from_path(&target) {
        bail!(
            "New {} master data {:?} must have the same format as {:?}",
            args.region,
            args.input,
            target
        );
    }

    // Refuse a file the builder would skip anyway.
    let candidate = RegionSource::new(args.region, Box::new(FileSource::new(&args.input)))
        .with_item_columns(region.item_columns());
    let projected = library::load_region(&candidate)?;
    info!(
        "✓ {:?} provides {} {} row(s)",
        args.input,
        projected.len(),
        args.region
    );

    let same_file = match (fs::canonicalize(&args.input), fs::canonicalize(&target)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if !same_file {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating directory {parent:?}"))?;
        }
        fs::copy(&args.input, &target)
            .with_context(|| format!("Copying {:?} to {:?}", args.input, target))?;
    }
    info!("{} master data updated at {:?}", args.region, target);

    let repository = config.repository();
    repository.invalidate()?;
    if args.build {
        ensure_library(config, &repository, BuildPolicy::Rebuild)?;
    } else {
        info!("Persisted library discarded; it is rebuilt on the next build or match");
    }
    Ok(())
}

fn handle_config_init(args: &cli::ConfigInitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "{:?} already exists; pass --force to overwrite it",
            args.output
        );
    }
    LookupConfig::default().save(&args.output)?;
    info!("Default configuration written to {:?}", args.output);
    Ok(())
}
