//! Enrichment of user item lists against the library.
//!
//! The user table is left-joined to the library on
//! `user[key column] == library["Item No. {anchor}"]`. No user row is ever
//! dropped; rows without a library match keep every library-derived cell
//! empty. The consistency flag is recomputed from the joined item numbers
//! instead of trusting the value stored in the library.

use std::path::Path;

use anyhow::Result;
use log::{debug, info};

use crate::{
    columns::ColumnCandidates,
    consistency::{CONSISTENCY_COLUMN, Consistency},
    error::LookupError,
    frame::Frame,
    join::{self, JoinKind, RightKeys},
    region::RegionCode,
    tabular::{self, ReadOptions, TableFormat},
    workbook,
};

pub const ARTICLE_LIST_SHEET: &str = "Article List";
pub const ARTICLE_LIST_HEADER_ROW: usize = 1;

/// How uploads with a dedicated article sheet are recognised and read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLayout {
    pub article_list_sheet: String,
    pub article_list_header_row: usize,
}

impl Default for UploadLayout {
    fn default() -> Self {
        Self {
            article_list_sheet: ARTICLE_LIST_SHEET.to_string(),
            article_list_header_row: ARTICLE_LIST_HEADER_ROW,
        }
    }
}

/// Reads an uploaded item list. Workbooks with an "Article List" sheet are
/// read from that sheet, below its title row.
pub fn read_upload(path: &Path, layout: &UploadLayout, base: &ReadOptions) -> Result<Frame> {
    let mut options = base.clone();
    if options.sheet.is_none() && TableFormat::from_path(path) == TableFormat::Workbook {
        if let Some(sheet) = workbook::find_sheet(path, &layout.article_list_sheet)? {
            debug!(
                "Reading article sheet '{sheet}' with header row offset {}",
                layout.article_list_header_row
            );
            options.sheet = Some(sheet);
            options.header_row = layout.article_list_header_row;
        }
    }
    tabular::read_table(path, &options)
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub table: Frame,
    pub key_column: String,
    pub input_rows: usize,
    pub matched_rows: usize,
    pub unmatched_rows: usize,
    pub mismatches: usize,
}

#[derive(Debug, Clone)]
pub struct Matcher {
    key_columns: ColumnCandidates,
    regions: Vec<RegionCode>,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(ColumnCandidates::default_key_columns(), RegionCode::ALL.to_vec())
    }
}

impl Matcher {
    pub fn new(key_columns: ColumnCandidates, regions: Vec<RegionCode>) -> Self {
        Self {
            key_columns,
            regions,
        }
    }

    pub fn match_items(
        &self,
        user: &Frame,
        library: &Frame,
        anchor: RegionCode,
    ) -> Result<MatchOutcome, LookupError> {
        let (key_idx, _) =
            self.key_columns
                .resolve(&user.headers)
                .ok_or_else(|| LookupError::NoKeyColumn {
                    candidates: self.key_columns.names().to_vec(),
                })?;
        let key_column = user.headers[key_idx].clone();

        let anchor_column = anchor.item_column_name();
        if library.find_column(&anchor_column).is_none() {
            return Err(LookupError::MissingAnchorColumn {
                region: anchor,
                column: anchor_column,
            });
        }

        // The stored flag is replaced by one recomputed after the join.
        let stored_flag = library.find_column(CONSISTENCY_COLUMN);
        let view_columns: Vec<(usize, String)> = library
            .headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| Some(*idx) != stored_flag)
            .map(|(idx, name)| (idx, name.trim().to_string()))
            .collect();
        let view = library.project(&view_columns);
        let anchor_idx = view
            .find_column(&anchor_column)
            .ok_or_else(|| LookupError::MissingAnchorColumn {
                region: anchor,
                column: anchor_column.clone(),
            })?;
        debug!("Matching '{key_column}' against library column '{anchor_column}'");

        let joined = join::join(
            user,
            &view,
            &[key_idx],
            &[anchor_idx],
            JoinKind::Left,
            RightKeys::Keep,
        );
        let mut table = joined.frame;

        let item_columns: Vec<usize> = self
            .regions
            .iter()
            .filter_map(|region| view.find_column(&region.item_column_name()))
            .map(|idx| user.width() + idx)
            .collect();
        let flags: Vec<String> = table
            .rows
            .iter()
            .zip(&joined.matched)
            .map(|(row, matched)| {
                if *matched {
                    Consistency::classify(
                        item_columns
                            .iter()
                            .map(|idx| row.get(*idx).map(String::as_str)),
                    )
                    .to_string()
                } else {
                    String::new()
                }
            })
            .collect();
        let mismatches = flags
            .iter()
            .filter(|flag| flag.as_str() == Consistency::Mismatch.as_str())
            .count();
        table.push_column(CONSISTENCY_COLUMN, flags);

        let unmatched_rows = joined.matched.iter().filter(|matched| !**matched).count();
        let outcome = MatchOutcome {
            input_rows: user.len(),
            matched_rows: user.len() - unmatched_rows,
            unmatched_rows,
            mismatches,
            key_column,
            table,
        };
        info!(
            "Matched {} of {} row(s) on '{}' ({} unmatched, {} mismatch(es))",
            outcome.matched_rows,
            outcome.input_rows,
            outcome.key_column,
            outcome.unmatched_rows,
            outcome.mismatches
        );
        Ok(outcome)
    }
}
