//! YAML configuration: where the regional master files and the persisted
//! library live, and how uploads are matched.
//!
//! Every field has a default mirroring the original deployment, so running
//! without a configuration file works from a directory holding the four
//! master-data workbooks. Relative paths resolve against `data_dir`, which in
//! turn resolves against the directory of the configuration file.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    columns::ColumnCandidates,
    matcher::{ARTICLE_LIST_HEADER_ROW, ARTICLE_LIST_SHEET, Matcher, UploadLayout},
    region::{FileSource, RegionCode, RegionSource},
    repository::FileLibraryRepository,
};

pub const DEFAULT_LIBRARY_FILE: &str = "library_data.xlsx";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionConfig {
    pub code: RegionCode,
    pub source: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_columns: Option<ColumnCandidates>,
}

impl RegionConfig {
    pub fn item_columns(&self) -> ColumnCandidates {
        self.item_columns
            .clone()
            .unwrap_or_else(|| ColumnCandidates::default_item_columns(self.code))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LookupConfig {
    pub data_dir: PathBuf,
    pub library: PathBuf,
    pub anchor: RegionCode,
    pub regions: Vec<RegionConfig>,
    pub key_columns: ColumnCandidates,
    pub article_list_sheet: String,
    pub article_list_header_row: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        let region = |code, source: &str| RegionConfig {
            code,
            source: PathBuf::from(source),
            item_columns: None,
        };
        Self {
            data_dir: PathBuf::from("."),
            library: PathBuf::from(DEFAULT_LIBRARY_FILE),
            anchor: RegionCode::Eur,
            regions: vec![
                region(
                    RegionCode::Eur,
                    "Muuto_Master_Data_CON_January_2025_EUR_IE.xlsx",
                ),
                region(
                    RegionCode::Apmea,
                    "Muuto_Master_Data_NET_Janaury_2025_APMEA.xlsx",
                ),
                region(
                    RegionCode::Gbp,
                    "Muuto_Master_Data_CON_January_2025_GBP.xlsx",
                ),
                region(
                    RegionCode::Us,
                    "Muuto_Master_Data_Contract_USD_January_2025.xlsx",
                ),
            ],
            key_columns: ColumnCandidates::default_key_columns(),
            article_list_sheet: ARTICLE_LIST_SHEET.to_string(),
            article_list_header_row: ARTICLE_LIST_HEADER_ROW,
        }
    }
}

impl LookupConfig {
    /// Loads `path` when given, otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading config file {path:?}"))?;
        let mut config: LookupConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing config file {path:?}"))?;
        if config.data_dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.data_dir = base.join(&config.data_dir);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Serializing config")?;
        let mut file =
            File::create(path).with_context(|| format!("Creating config file {path:?}"))?;
        file.write_all(yaml.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.key_columns.is_empty(), "key_columns cannot be empty");
        for (idx, region) in self.regions.iter().enumerate() {
            if self.regions[..idx].iter().any(|r| r.code == region.code) {
                return Err(anyhow!("Region {} is configured more than once", region.code));
            }
            if region
                .item_columns
                .as_ref()
                .is_some_and(ColumnCandidates::is_empty)
            {
                return Err(anyhow!("Region {} lists no item columns", region.code));
            }
        }
        Ok(())
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    pub fn library_path(&self) -> PathBuf {
        self.resolve(&self.library)
    }

    pub fn region(&self, code: RegionCode) -> Option<&RegionConfig> {
        self.regions.iter().find(|r| r.code == code)
    }

    pub fn region_paths(&self) -> Vec<(RegionCode, PathBuf)> {
        self.regions
            .iter()
            .map(|r| (r.code, self.resolve(&r.source)))
            .collect()
    }

    /// One file-backed source per configured region. Unreadable files are
    /// skipped by the builder, not here.
    pub fn region_sources(&self) -> Vec<RegionSource> {
        self.regions
            .iter()
            .map(|r| {
                RegionSource::new(r.code, Box::new(FileSource::new(self.resolve(&r.source))))
                    .with_item_columns(r.item_columns())
            })
            .collect()
    }

    pub fn repository(&self) -> FileLibraryRepository {
        FileLibraryRepository::new(self.library_path())
    }

    pub fn upload_layout(&self) -> UploadLayout {
        UploadLayout {
            article_list_sheet: self.article_list_sheet.clone(),
            article_list_header_row: self.article_list_header_row,
        }
    }

    pub fn matcher(&self) -> Matcher {
        Matcher::new(
            self.key_columns.clone(),
            self.regions.iter().map(|r| r.code).collect(),
        )
    }
}
