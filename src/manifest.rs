//! Provenance written next to a freshly built library.
//!
//! The manifest records when the library was built and a SHA-256 fingerprint
//! of every regional source file. It is advisory: a stale manifest is reported
//! by `status`, but the persisted library stays authoritative until it is
//! rebuilt explicitly.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{library::BuildReport, region::RegionCode};

const MANIFEST_SUFFIX: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    pub region: RegionCode,
    pub source: PathBuf,
    pub sha256: String,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryManifest {
    pub built_at: DateTime<Utc>,
    pub sources: Vec<SourceFingerprint>,
    pub rows: usize,
    pub mismatches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceState {
    Unchanged,
    Changed,
    Missing,
    /// Present now but not part of the last build.
    New,
}

impl SourceState {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceState::Unchanged => "unchanged",
            SourceState::Changed => "changed",
            SourceState::Missing => "missing",
            SourceState::New => "new",
        }
    }
}

impl LibraryManifest {
    /// Fingerprints the file behind every region that was loaded in `report`.
    pub fn capture(report: &BuildReport, sources: &[(RegionCode, PathBuf)]) -> Result<Self> {
        let mut fingerprints = Vec::with_capacity(report.regions_loaded.len());
        for loaded in &report.regions_loaded {
            let Some((_, path)) = sources.iter().find(|(region, _)| *region == loaded.region)
            else {
                continue;
            };
            fingerprints.push(SourceFingerprint {
                region: loaded.region,
                source: path.clone(),
                sha256: fingerprint_file(path)?,
                rows: loaded.rows,
            });
        }
        Ok(Self {
            built_at: Utc::now(),
            sources: fingerprints,
            rows: report.rows,
            mismatches: report.mismatches,
        })
    }

    pub fn save(&self, library_path: &Path) -> Result<()> {
        let path = manifest_path(library_path);
        let file = File::create(&path).with_context(|| format!("Creating manifest {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing manifest JSON")
    }

    pub fn load(library_path: &Path) -> Result<Option<Self>> {
        let path = manifest_path(library_path);
        if !path.is_file() {
            return Ok(None);
        }
        let file = File::open(&path).with_context(|| format!("Opening manifest {path:?}"))?;
        let manifest = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing manifest {path:?}"))?;
        Ok(Some(manifest))
    }

    /// Compares the recorded fingerprints with the files on disk now.
    pub fn compare(&self, sources: &[(RegionCode, PathBuf)]) -> Vec<(RegionCode, SourceState)> {
        sources
            .iter()
            .map(|(region, path)| {
                let recorded = self.sources.iter().find(|f| f.region == *region);
                let state = match (recorded, fingerprint_file(path).ok()) {
                    (Some(_), None) => SourceState::Missing,
                    (Some(f), Some(current)) if f.sha256 == current => SourceState::Unchanged,
                    (Some(_), Some(_)) => SourceState::Changed,
                    (None, Some(_)) => SourceState::New,
                    (None, None) => SourceState::Missing,
                };
                (*region, state)
            })
            .collect()
    }
}

pub fn manifest_path(library_path: &Path) -> PathBuf {
    let mut name = library_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(MANIFEST_SUFFIX);
    library_path.with_file_name(name)
}

pub fn fingerprint_file(path: &Path) -> Result<String> {
    let mut file = BufReader::new(
        File::open(path).with_context(|| format!("Opening {path:?} for fingerprinting"))?,
    );
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
