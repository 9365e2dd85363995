use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::PreviewArgs,
    io_utils, table,
    tabular::{self, ReadOptions},
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let options = ReadOptions {
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
        sheet: args.sheet.clone(),
        header_row: args.header_row,
    };
    let frame = tabular::read_table(&args.input, &options)
        .with_context(|| format!("Reading {:?}", args.input))?;

    table::print_frame(&frame, Some(args.rows));
    info!(
        "Displayed {} of {} row(s) from {:?}",
        args.rows.min(frame.len()),
        frame.len(),
        args.input
    );
    Ok(())
}
