//! Tabular export of crawl results
//!
//! Comma-separated, one header row, RFC 4180 quoting. Absent values are
//! written as empty cells and release dates as `YYYY-MM-DD`.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::mem::take;
use std::path::Path;
use tracing::info;

use crate::domain::Record;

pub const SEPARATOR: char = ',';

pub const BASE_COLUMNS: [&str; 4] = ["rank", "title", "release_date", "score"];
pub const SUPPLEMENTAL_COLUMN: &str = "supplemental_count";

/// Header row for an export
pub fn header(include_supplemental: bool) -> Vec<String> {
    let mut columns: Vec<String> = BASE_COLUMNS.iter().map(ToString::to_string).collect();
    if include_supplemental {
        columns.push(SUPPLEMENTAL_COLUMN.to_string());
    }
    columns
}

/// One record as export cells
pub fn record_to_row(record: &Record, include_supplemental: bool) -> Vec<String> {
    let mut row = vec![
        record.rank.clone().unwrap_or_default(),
        record.title.clone().unwrap_or_default(),
        record
            .release_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        record.score.map(|s| s.to_string()).unwrap_or_default(),
    ];
    if include_supplemental {
        row.push(
            record
                .supplemental_count
                .map(|c| c.to_string())
                .unwrap_or_default(),
        );
    }
    row
}

/// Write `records` (already ordered) to `path`, replacing any existing file
pub fn write_records(path: &Path, records: &[Record], include_supplemental: bool) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    write_row(&mut writer, &header(include_supplemental))?;
    for record in records {
        write_row(&mut writer, &record_to_row(record, include_supplemental))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV file: {}", path.display()))?;

    info!("💾 Saved {} records to {}", records.len(), path.display());
    Ok(())
}

/// Render rows (header included) to a string
pub fn rows_to_string(rows: &[Vec<String>]) -> String {
    let mut buf: Vec<u8> = Vec::new();
    for row in rows {
        // Writing into a Vec cannot fail
        let _ = write_row(&mut buf, row);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn needs_quotes(field: &str) -> bool {
    field.contains(SEPARATOR) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single row to any writer
pub fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    for (index, cell) in row.iter().enumerate() {
        if index > 0 {
            write!(w, "{SEPARATOR}")?;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{cell}")?;
        }
    }
    writeln!(w)
}

/// Parse CSV text into rows. Quotes and CRLF tolerant; blank lines are skipped.
pub fn read_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            c if c == SEPARATOR && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                if row.len() == 1 && row[0].is_empty() {
                    row.clear();
                } else {
                    rows.push(take(&mut row));
                }
            }
            _ => field.push(ch),
        }
    }

    // Trailing row without a final newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}
