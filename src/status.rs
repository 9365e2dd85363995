//! `status`: what the persisted library looks like and whether the regional
//! sources moved on since it was built.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;

use crate::{
    cli::StatusArgs,
    config::LookupConfig,
    error::LookupError,
    manifest::{LibraryManifest, SourceState},
    region::RegionCode,
    repository::{FileLibraryRepository, LibraryRepository, count_mismatches},
};

#[derive(Debug, Serialize)]
pub struct SourceStatus {
    pub region: RegionCode,
    pub path: PathBuf,
    pub state: SourceState,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub library: PathBuf,
    pub present: bool,
    /// Why a present library could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrupt: Option<String>,
    pub rows: Option<usize>,
    pub mismatches: Option<usize>,
    pub built_at: Option<DateTime<Utc>>,
    pub sources: Vec<SourceStatus>,
}

impl StatusReport {
    pub fn is_stale(&self) -> bool {
        self.sources
            .iter()
            .any(|s| matches!(s.state, SourceState::Changed | SourceState::New))
    }
}

pub fn collect(config: &LookupConfig, repository: &FileLibraryRepository) -> Result<StatusReport> {
    let present = repository.exists();
    let (library, corrupt) = match present.then(|| repository.load()) {
        Some(Ok(library)) => (Some(library), None),
        Some(Err(LookupError::LibraryCorrupt { reason, .. })) => (None, Some(reason)),
        Some(Err(err)) => return Err(err.into()),
        None => (None, None),
    };
    let manifest = LibraryManifest::load(repository.path())?;
    let paths = config.region_paths();
    let states = match &manifest {
        Some(manifest) => manifest.compare(&paths),
        None => paths
            .iter()
            .map(|(region, path)| {
                let state = if path.is_file() {
                    SourceState::New
                } else {
                    SourceState::Missing
                };
                (*region, state)
            })
            .collect(),
    };
    let sources = paths
        .into_iter()
        .zip(states)
        .map(|((region, path), (_, state))| SourceStatus {
            region,
            path,
            state,
        })
        .collect();

    Ok(StatusReport {
        library: repository.path().to_path_buf(),
        present,
        corrupt,
        rows: library.as_ref().map(|l| l.len()),
        mismatches: library.as_ref().map(count_mismatches),
        built_at: manifest.map(|m| m.built_at),
        sources,
    })
}

pub fn execute(config: &LookupConfig, args: &StatusArgs) -> Result<()> {
    let repository = match &args.library {
        Some(path) => FileLibraryRepository::new(path),
        None => config.repository(),
    };
    let report = collect(config, &repository)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report));
    }
    if report.corrupt.is_some() {
        warn!("Library {:?} is unreadable; run `build --rebuild`", report.library);
    } else if report.present && report.is_stale() {
        warn!("Regional sources changed since the library was built; run `build --rebuild`");
    }
    Ok(())
}

fn render(report: &StatusReport) -> String {
    let mut out = format!("library: {}\n", report.library.display());
    match (&report.corrupt, report.rows, report.mismatches) {
        (Some(reason), _, _) => out.push_str(&format!("state: corrupt ({reason})\n")),
        (None, Some(rows), Some(mismatches)) => {
            out.push_str(&format!("rows: {rows}\nmismatches: {mismatches}\n"));
        }
        _ => out.push_str("state: not built\n"),
    }
    if let Some(built_at) = report.built_at {
        out.push_str(&format!("built_at: {}\n", built_at.to_rfc3339()));
    }
    for source in &report.sources {
        out.push_str(&format!(
            "{:<6} {:<9} {}\n",
            source.region.as_str(),
            source.state.as_str(),
            source.path.display()
        ));
    }
    out
}
