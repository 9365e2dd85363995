//! Regions, their item-numbering schemes, and where their master data comes from.

use std::{fmt, path::PathBuf, str::FromStr};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{
    columns::ColumnCandidates,
    frame::Frame,
    tabular::{self, ReadOptions},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegionCode {
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "APMEA")]
    Apmea,
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "US")]
    Us,
}

impl RegionCode {
    pub const ALL: [RegionCode; 4] = [
        RegionCode::Eur,
        RegionCode::Apmea,
        RegionCode::Gbp,
        RegionCode::Us,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RegionCode::Eur => "EUR",
            RegionCode::Apmea => "APMEA",
            RegionCode::Gbp => "GBP",
            RegionCode::Us => "US",
        }
    }

    /// Header of this region's item-number column in the library.
    pub fn item_column_name(self) -> String {
        format!("Item No. {}", self.as_str())
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionCode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        RegionCode::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                format!("Unknown region '{trimmed}' (expected one of EUR, APMEA, GBP, US)")
            })
    }
}

/// Anything a region's raw master table can be loaded from.
pub trait TableSource {
    fn describe(&self) -> String;
    fn load(&self) -> Result<Frame>;
}

#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
    pub options: ReadOptions,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: ReadOptions::default(),
        }
    }
}

impl TableSource for FileSource {
    fn describe(&self) -> String {
        format!("{:?}", self.path)
    }

    fn load(&self) -> Result<Frame> {
        tabular::read_table(&self.path, &self.options)
    }
}

impl TableSource for Frame {
    fn describe(&self) -> String {
        format!("in-memory table ({} row(s))", self.len())
    }

    fn load(&self) -> Result<Frame> {
        Ok(self.clone())
    }
}

pub struct RegionSource {
    pub region: RegionCode,
    pub source: Box<dyn TableSource>,
    pub item_columns: ColumnCandidates,
}

impl RegionSource {
    pub fn new(region: RegionCode, source: Box<dyn TableSource>) -> Self {
        Self {
            region,
            source,
            item_columns: ColumnCandidates::default_item_columns(region),
        }
    }

    pub fn with_item_columns(mut self, item_columns: ColumnCandidates) -> Self {
        self.item_columns = item_columns;
        self
    }
}

impl fmt::Debug for RegionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionSource")
            .field("region", &self.region)
            .field("source", &self.source.describe())
            .field("item_columns", &self.item_columns)
            .finish()
    }
}
