//! Library assembly: regional master tables merged into one reference table
//! keyed by (product, color).
//!
//! Each region is projected to its item-number, `PRODUCT` and `COLOR`
//! columns, then the regions are folded together left to right with a full
//! outer join. A (product, color) pair present in only some regions still
//! yields one row, with the other regions' item numbers absent. Pairs repeated
//! within a region fan out combinatorially; that is accepted as-is.

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    consistency::{CONSISTENCY_COLUMN, Consistency},
    error::LookupError,
    frame::Frame,
    join::{self, JoinKind, RightKeys},
    region::{RegionCode, RegionSource},
    repository::{LibraryRepository, count_mismatches},
};

pub const SOURCE_PRODUCT_COLUMN: &str = "PRODUCT";
pub const SOURCE_COLOR_COLUMN: &str = "COLOR";
pub const PRODUCT_COLUMN: &str = "Product";
pub const COLOR_COLUMN: &str = "Color";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildPolicy {
    /// Return the persisted library untouched when one exists.
    #[default]
    ReuseIfPresent,
    /// Ignore any persisted library and merge the sources again.
    Rebuild,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionLoad {
    pub region: RegionCode,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub regions_loaded: Vec<RegionLoad>,
    pub regions_skipped: Vec<RegionCode>,
    pub rows: usize,
    pub mismatches: usize,
}

#[derive(Debug, Clone)]
pub enum LibraryOrigin {
    Reused,
    Built(BuildReport),
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub library: Frame,
    pub origin: LibraryOrigin,
}

pub struct LibraryBuilder {
    regions: Vec<RegionSource>,
}

impl LibraryBuilder {
    pub fn new(regions: Vec<RegionSource>) -> Self {
        Self { regions }
    }

    pub fn build(
        &self,
        repository: &dyn LibraryRepository,
        policy: BuildPolicy,
    ) -> Result<BuildOutcome, LookupError> {
        if policy == BuildPolicy::ReuseIfPresent && repository.exists() {
            let library = repository.load()?;
            info!("Reusing persisted library ({} row(s))", library.len());
            return Ok(BuildOutcome {
                library,
                origin: LibraryOrigin::Reused,
            });
        }

        let mut tables = Vec::with_capacity(self.regions.len());
        let mut regions_loaded = Vec::new();
        let mut regions_skipped = Vec::new();
        for source in &self.regions {
            match load_region(source) {
                Ok(table) => {
                    info!(
                        "✓ Loaded {} master data from {} ({} row(s))",
                        source.region,
                        source.source.describe(),
                        table.len()
                    );
                    regions_loaded.push(RegionLoad {
                        region: source.region,
                        rows: table.len(),
                    });
                    tables.push((source.region, table));
                }
                Err(err) => {
                    warn!("Skipping region {}: {err}", source.region);
                    regions_skipped.push(source.region);
                }
            }
        }

        let library = assemble(tables)?;
        repository.save(&library)?;
        let report = BuildReport {
            regions_loaded,
            regions_skipped,
            rows: library.len(),
            mismatches: count_mismatches(&library),
        };
        info!(
            "Library built: {} row(s), {} mismatch(es)",
            report.rows, report.mismatches
        );
        Ok(BuildOutcome {
            library,
            origin: LibraryOrigin::Built(report),
        })
    }
}

/// Loads one region's master table and projects it to
/// `Item No. {region}`, `PRODUCT`, `COLOR`.
pub fn load_region(source: &RegionSource) -> Result<Frame, LookupError> {
    let malformed = |reason: String| LookupError::MalformedSourceFile {
        region: source.region,
        source_name: source.source.describe(),
        reason,
    };

    let mut raw = source.source.load().map_err(|err| malformed(format!("{err:#}")))?;
    raw.trim_headers();

    let (item_idx, item_name) = source.item_columns.resolve(&raw.headers).ok_or_else(|| {
        malformed(format!(
            "no item-number column (expected one of: {})",
            source.item_columns.names().join(", ")
        ))
    })?;
    debug!("Region {} item numbers read from '{item_name}'", source.region);

    let mut columns = vec![(item_idx, source.region.item_column_name())];
    for required in [SOURCE_PRODUCT_COLUMN, SOURCE_COLOR_COLUMN] {
        let idx = raw
            .find_column(required)
            .ok_or_else(|| malformed(format!("missing '{required}' column")))?;
        columns.push((idx, required.to_string()));
    }
    Ok(raw.project(&columns))
}

/// Merges projected region tables into the final library layout:
/// `Product, Color, Item No. <region>..., Item No. Consistency`.
pub fn assemble(tables: Vec<(RegionCode, Frame)>) -> Result<Frame, LookupError> {
    let mut tables = tables.into_iter();
    let (first_region, first) = tables.next().ok_or(LookupError::NoSourceData)?;
    let mut regions = vec![first_region];
    let mut merged = first;

    for (region, table) in tables {
        let left_keys = key_indices(&merged)?;
        let right_keys = key_indices(&table)?;
        merged = join::join(
            &merged,
            &table,
            &left_keys,
            &right_keys,
            JoinKind::Full,
            RightKeys::Merge,
        )
        .frame;
        regions.push(region);
    }

    let [product_idx, color_idx] = key_indices(&merged)?;
    let mut layout = vec![
        (product_idx, PRODUCT_COLUMN.to_string()),
        (color_idx, COLOR_COLUMN.to_string()),
    ];
    for region in &regions {
        let name = region.item_column_name();
        if let Some(idx) = merged.column_index(&name) {
            layout.push((idx, name));
        }
    }
    let mut library = merged.project(&layout);

    let item_columns: Vec<usize> = (2..library.width()).collect();
    let flags = consistency_column(&library, &item_columns);
    library.push_column(CONSISTENCY_COLUMN, flags);
    Ok(library)
}

fn key_indices(frame: &Frame) -> Result<[usize; 2], LookupError> {
    match (
        frame.column_index(SOURCE_PRODUCT_COLUMN),
        frame.column_index(SOURCE_COLOR_COLUMN),
    ) {
        (Some(product), Some(color)) => Ok([product, color]),
        // Projected region tables always carry both keys.
        _ => Err(LookupError::NoSourceData),
    }
}

/// Classifies every row over the given item-number columns.
pub fn consistency_column(frame: &Frame, item_columns: &[usize]) -> Vec<String> {
    frame
        .rows
        .iter()
        .map(|row| {
            Consistency::classify(
                item_columns
                    .iter()
                    .map(|idx| row.get(*idx).map(String::as_str)),
            )
            .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryLibraryRepository;

    fn master(rows: &[(&str, &str, &str)]) -> Frame {
        Frame::new(
            vec![" ITEM NO.".into(), "PRODUCT ".into(), "COLOR".into(), "PRICE".into()],
            rows.iter()
                .map(|(item, product, color)| {
                    vec![item.to_string(), product.to_string(), color.to_string(), "10".into()]
                })
                .collect(),
        )
    }

    fn source(region: RegionCode, frame: Frame) -> RegionSource {
        RegionSource::new(region, Box::new(frame))
    }

    #[test]
    fn load_region_projects_and_renames() {
        let table = load_region(&source(RegionCode::Eur, master(&[("65001", "Table", "White")])))
            .expect("load");
        assert_eq!(table.headers, vec!["Item No. EUR", "PRODUCT", "COLOR"]);
        assert_eq!(table.rows[0], vec!["65001", "Table", "White"]);
    }

    #[test]
    fn load_region_reads_us_pattern_numbers() {
        let frame = Frame::new(
            vec!["PATTERN NO.".into(), "PRODUCT".into(), "COLOR".into()],
            vec![vec!["65002".into(), "Table".into(), "White".into()]],
        );
        let table = load_region(&source(RegionCode::Us, frame)).expect("load");
        assert_eq!(table.headers[0], "Item No. US");
        assert_eq!(table.rows[0][0], "65002");
    }

    #[test]
    fn load_region_without_color_is_malformed() {
        let frame = Frame::new(vec!["ITEM NO.".into(), "PRODUCT".into()], Vec::new());
        let err = load_region(&source(RegionCode::Gbp, frame)).unwrap_err();
        assert!(matches!(
            err,
            LookupError::MalformedSourceFile {
                region: RegionCode::Gbp,
                ..
            }
        ));
    }

    #[test]
    fn assemble_orders_columns_and_flags_rows() {
        let eur = load_region(&source(
            RegionCode::Eur,
            master(&[("65001", "Table", "White"), ("70000", "Sofa", "Blue")]),
        ))
        .expect("eur");
        let us = load_region(&source(RegionCode::Us, master(&[("65002", "Table", "White")])))
            .expect("us");
        let library = assemble(vec![(RegionCode::Eur, eur), (RegionCode::Us, us)]).expect("merge");

        assert_eq!(
            library.headers,
            vec!["Product", "Color", "Item No. EUR", "Item No. US", CONSISTENCY_COLUMN]
        );
        assert_eq!(
            library.rows[0],
            vec!["Table", "White", "65001", "65002", "Mismatch"]
        );
        assert_eq!(library.rows[1], vec!["Sofa", "Blue", "70000", "", "Match"]);
    }

    #[test]
    fn assemble_fans_out_repeated_pairs() {
        let eur = load_region(&source(
            RegionCode::Eur,
            master(&[("65001", "Table", "White"), ("65005", "Table", "White")]),
        ))
        .expect("eur");
        let gbp = load_region(&source(
            RegionCode::Gbp,
            master(&[("65001", "Table", "White"), ("65009", "Table", "White")]),
        ))
        .expect("gbp");
        let library = assemble(vec![(RegionCode::Eur, eur), (RegionCode::Gbp, gbp)]).expect("merge");

        assert_eq!(library.len(), 4);
        let pairs: Vec<(&str, &str, &str)> = library
            .rows
            .iter()
            .map(|row| (row[2].as_str(), row[3].as_str(), row[4].as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("65001", "65001", "Match"),
                ("65001", "65009", "Mismatch"),
                ("65005", "65001", "Mismatch"),
                ("65005", "65009", "Mismatch"),
            ]
        );
    }

    #[test]
    fn assemble_without_tables_reports_no_source_data() {
        assert!(matches!(assemble(Vec::new()), Err(LookupError::NoSourceData)));
    }

    #[test]
    fn build_skips_malformed_regions() {
        let broken = Frame::new(vec!["SKU".into()], Vec::new());
        let builder = LibraryBuilder::new(vec![
            source(RegionCode::Eur, master(&[("65001", "Table", "White")])),
            source(RegionCode::Apmea, broken),
        ]);
        let repo = MemoryLibraryRepository::new();
        let outcome = builder.build(&repo, BuildPolicy::ReuseIfPresent).expect("build");

        match outcome.origin {
            LibraryOrigin::Built(report) => {
                assert_eq!(report.regions_skipped, vec![RegionCode::Apmea]);
                assert_eq!(report.rows, 1);
            }
            LibraryOrigin::Reused => panic!("expected a fresh build"),
        }
        assert!(repo.exists());
    }

    #[test]
    fn build_reuses_persisted_library() {
        let persisted = Frame::new(vec!["Product".into(), "Color".into()], Vec::new());
        let repo = MemoryLibraryRepository::with_library(persisted.clone());
        let builder = LibraryBuilder::new(Vec::new());

        let outcome = builder.build(&repo, BuildPolicy::ReuseIfPresent).expect("reuse");
        assert!(matches!(outcome.origin, LibraryOrigin::Reused));
        assert_eq!(outcome.library, persisted);

        let err = builder.build(&repo, BuildPolicy::Rebuild).unwrap_err();
        assert!(matches!(err, LookupError::NoSourceData));
    }
}
