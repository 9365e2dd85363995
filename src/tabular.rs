//! Format-agnostic table reading and writing. The path extension decides
//! whether a file goes through the delimited or the workbook backend.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};

use crate::{frame::Frame, io_utils, workbook};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Delimited,
    Workbook,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Self {
        if workbook::is_workbook_path(path) {
            TableFormat::Workbook
        } else {
            TableFormat::Delimited
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    pub sheet: Option<String>,
    pub header_row: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            sheet: None,
            header_row: 0,
        }
    }
}

/// Reads a table and trims surrounding whitespace from its headers.
pub fn read_table(path: &Path, options: &ReadOptions) -> Result<Frame> {
    let mut frame = match TableFormat::from_path(path) {
        TableFormat::Workbook => {
            workbook::read_sheet(path, options.sheet.as_deref(), options.header_row)?
        }
        TableFormat::Delimited => {
            let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
            io_utils::read_delimited(path, delimiter, options.encoding, options.header_row)?
        }
    };
    frame.trim_headers();
    Ok(frame)
}

/// Writes a table; `None` or `-` sends delimited text to stdout.
pub fn write_table(frame: &Frame, path: Option<&Path>, delimiter: Option<u8>) -> Result<()> {
    match path {
        Some(p) if !io_utils::is_dash(p) && TableFormat::from_path(p) == TableFormat::Workbook => {
            workbook::write_workbook(frame, p, None)
                .with_context(|| format!("Writing workbook {p:?}"))
        }
        _ => {
            let delimiter = io_utils::resolve_output_delimiter(
                path,
                delimiter,
                io_utils::DEFAULT_CSV_DELIMITER,
            );
            io_utils::write_delimited(frame, path, delimiter)
        }
    }
}
