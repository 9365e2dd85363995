//! Aligned plain-text rendering of a [`Frame`] for terminal previews.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::frame::Frame;

/// Renders the header and up to `limit` rows; a trailing line reports how
/// many rows were left out.
pub fn render_frame(frame: &Frame, limit: Option<usize>) -> String {
    let shown = limit.unwrap_or(frame.len()).min(frame.len());
    let rows = &frame.rows[..shown];

    let mut widths = frame
        .headers
        .iter()
        .map(|h| display_width(h))
        .collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(&frame.headers, &widths));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }

    let hidden = frame.len() - shown;
    if hidden > 0 {
        let _ = writeln!(output, "... {hidden} more row(s)");
    }
    output
}

pub fn print_frame(frame: &Frame, limit: Option<usize>) {
    print!("{}", render_frame(frame, limit));
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&sanitized));
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
