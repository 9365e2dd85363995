//! Declarative, priority-ordered column-name matching.
//!
//! Upstream spreadsheets drift in header case and spacing, so every lookup
//! goes through [`normalize_header`]. Candidates are tried in the order they
//! were declared; the first one present in the headers wins regardless of
//! where it sits in the table.

use serde::{Deserialize, Serialize};

use crate::region::RegionCode;

pub const DEFAULT_KEY_COLUMNS: &[&str] = &["Item variant number", "Item no.", "Article No."];
pub const ITEM_NUMBER_COLUMN: &str = "ITEM NO.";
pub const PATTERN_NUMBER_COLUMN: &str = "PATTERN NO.";

pub fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnCandidates(Vec<String>);

impl ColumnCandidates {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn default_key_columns() -> Self {
        Self::new(DEFAULT_KEY_COLUMNS.iter().copied())
    }

    pub fn default_item_columns(region: RegionCode) -> Self {
        match region {
            RegionCode::Us => Self::new([PATTERN_NUMBER_COLUMN, ITEM_NUMBER_COLUMN]),
            _ => Self::new([ITEM_NUMBER_COLUMN]),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the header index and the candidate that matched it.
    pub fn resolve(&self, headers: &[String]) -> Option<(usize, &str)> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        self.0.iter().find_map(|candidate| {
            let wanted = normalize_header(candidate);
            normalized
                .iter()
                .position(|h| *h == wanted)
                .map(|idx| (idx, candidate.as_str()))
        })
    }
}
