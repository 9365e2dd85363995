//! Spreadsheet I/O (xlsx, xls, xlsb, ods) via `calamine` for reading and
//! `rust_xlsxwriter` for writing.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, Sheets, open_workbook_auto};
use rust_xlsxwriter::{Format, Workbook};

use crate::{columns::normalize_header, frame::Frame};

pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];
const DEFAULT_SHEET_NAME: &str = "Sheet1";

pub fn is_workbook_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn open(path: &Path) -> Result<Sheets<std::io::BufReader<std::fs::File>>> {
    open_workbook_auto(path).with_context(|| format!("Opening workbook {path:?}"))
}

pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    Ok(open(path)?.sheet_names().to_vec())
}

/// Finds a sheet by name, ignoring case and surrounding whitespace.
pub fn find_sheet(path: &Path, name: &str) -> Result<Option<String>> {
    let wanted = normalize_header(name);
    Ok(sheet_names(path)?
        .into_iter()
        .find(|sheet| normalize_header(sheet) == wanted))
}

/// Reads one sheet (the first when `sheet` is `None`) into a frame. The header
/// sits `header_row` rows below the top of the sheet; blank leading rows that
/// fall outside the used range count towards that offset.
pub fn read_sheet(path: &Path, sheet: Option<&str>, header_row: usize) -> Result<Frame> {
    let mut workbook = open(path)?;
    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("Workbook {path:?} contains no sheets"))?,
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Reading sheet '{sheet_name}' from {path:?}"))?;

    // The used range starts at the first non-empty row, not at sheet row 0.
    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows = range
        .rows()
        .skip(header_row.saturating_sub(first_row))
        .map(|row| row.iter().map(render_cell).collect::<Vec<String>>());
    let headers = rows
        .next()
        .ok_or_else(|| anyhow!("Sheet '{sheet_name}' in {path:?} has no header row"))?;
    let body = rows
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();
    Ok(Frame::new(headers, body))
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => render_float(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => render_float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{e:?}"),
    }
}

/// Item numbers arrive as floats; integral values print without a fraction.
fn render_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

pub fn write_workbook(frame: &Frame, path: &Path, sheet_name: Option<&str>) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook
        .add_worksheet()
        .set_name(sheet_name.unwrap_or(DEFAULT_SHEET_NAME))
        .map_err(|e| anyhow!("Failed to create sheet: {e}"))?;

    for (col, header) in frame.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, column_number(col)?, header, &header_format)
            .map_err(|e| anyhow!("Failed to write header '{header}': {e}"))?;
    }
    for (row_idx, row) in frame.rows.iter().enumerate() {
        let row_number = u32::try_from(row_idx + 1)
            .map_err(|_| anyhow!("Row {} exceeds the worksheet limit", row_idx + 1))?;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(row_number, column_number(col)?, value)
                .map_err(|e| anyhow!("Failed to write row {}: {e}", row_idx + 2))?;
        }
    }

    workbook
        .save(path)
        .map_err(|e| anyhow!("Failed to save workbook {path:?}: {e}"))
}

fn column_number(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| anyhow!("Column {} exceeds the worksheet limit", col + 1))
}
