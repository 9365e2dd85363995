//! Domain errors surfaced by library assembly and matching.
//!
//! Command handlers wrap these in `anyhow` with context; library consumers can
//! match on the variant to decide what to show the user.

use std::path::PathBuf;

use thiserror::Error;

use crate::region::RegionCode;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("No regional master data could be loaded; provide at least one region source")]
    NoSourceData,
    #[error("Persisted library {path:?} is unreadable: {reason}")]
    LibraryCorrupt { path: PathBuf, reason: String },
    #[error("No key column found; expected one of: {}", candidates.join(", "))]
    NoKeyColumn { candidates: Vec<String> },
    #[error("Library has no '{column}' column for anchor region {region}")]
    MissingAnchorColumn { region: RegionCode, column: String },
    #[error("Region {region} source {source_name} is malformed: {reason}")]
    MalformedSourceFile {
        region: RegionCode,
        source_name: String,
        reason: String,
    },
    #[error("Library storage {path:?} failed: {reason}")]
    Storage { path: PathBuf, reason: String },
}

impl LookupError {
    pub(crate) fn storage(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        LookupError::Storage {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }
}
