use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::{GB18030, UTF_8};
use std::path::Path;
use tracing::{debug, info};

use super::{Cell, Grid};

const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];
const SNIFF_LINES: usize = 10;

/// Read a CSV quotation sheet into a grid
///
/// Every cell is text; numbers are parsed later by the field mapper. Blank
/// lines are kept as empty rows so header positions match what the user
/// sees in a spreadsheet.
pub fn read_csv_grid<P: AsRef<Path>>(file_path: P) -> Result<Grid> {
    let path = file_path.as_ref();
    info!("Parsing CSV sheet: {:?}", path);

    let bytes = std::fs::read(path).with_context(|| format!("Failed to read CSV file {:?}", path))?;
    let grid = parse_csv_bytes(&bytes)?;

    info!("Read {} rows from CSV", grid.len());
    Ok(grid)
}

/// Decode raw bytes (UTF-8 with optional BOM, else GB18030) and parse them
pub fn parse_csv_bytes(bytes: &[u8]) -> Result<Grid> {
    let (text, malformed) = UTF_8.decode_with_bom_removal(bytes);
    if !malformed {
        return parse_csv_text(&text);
    }

    debug!("CSV is not valid UTF-8, decoding as GB18030");
    let (text, _, _) = GB18030.decode(bytes);
    parse_csv_text(&text)
}

/// Parse CSV text into a grid
///
/// Physical lines are grouped into logical records (a quoted cell may span
/// lines) and each record is parsed on its own, so every blank line in the
/// text becomes an empty row at the same position.
pub fn parse_csv_text(text: &str) -> Result<Grid> {
    let delimiter = sniff_delimiter(text);
    debug!("CSV delimiter: {:?}", delimiter as char);

    let mut builder = ReaderBuilder::new();
    builder.has_headers(false).flexible(true).delimiter(delimiter);

    let mut grid: Grid = Vec::new();
    let mut logical = String::new();
    let mut in_quotes = false;

    for line in text.lines() {
        if in_quotes {
            logical.push('\n');
        }
        logical.push_str(line);
        in_quotes = ends_inside_quotes(line, delimiter, in_quotes);
        if !in_quotes {
            grid.push(parse_record(&builder, &logical)?);
            logical.clear();
        }
    }
    // Unterminated quote at end of input
    if in_quotes {
        grid.push(parse_record(&builder, &logical)?);
    }

    Ok(grid)
}

/// Parse one logical record; whitespace-only records are empty rows
fn parse_record(builder: &ReaderBuilder, logical: &str) -> Result<Vec<Cell>> {
    if logical.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = builder.from_reader(logical.as_bytes());
    let mut record = StringRecord::new();
    if !reader
        .read_record(&mut record)
        .context("Failed to read CSV record")?
    {
        return Ok(Vec::new());
    }
    Ok(record.iter().map(Cell::text).collect())
}

/// Whether a quoted cell is still open at the end of `line`
///
/// A quote only opens a cell at the start of a field; elsewhere it is a
/// literal character (an inch mark in a description, say). `""` inside a
/// quoted cell is an escaped quote.
fn ends_inside_quotes(line: &str, delimiter: u8, mut in_quotes: bool) -> bool {
    let bytes = line.as_bytes();
    let mut at_field_start = !in_quotes;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quotes {
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    in_quotes = false;
                }
            }
            at_field_start = false;
        } else if b == b'"' && at_field_start {
            in_quotes = true;
            at_field_start = false;
        } else {
            at_field_start = b == delimiter;
        }
        i += 1;
    }
    in_quotes
}

/// Pick the delimiter that occurs most often in the first lines (comma on ties)
fn sniff_delimiter(text: &str) -> u8 {
    let sample: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = b',';
    let mut best_count = 0;
    for candidate in CANDIDATE_DELIMITERS {
        let count: usize = sample
            .iter()
            .map(|line| line.bytes().filter(|b| *b == candidate).count())
            .sum();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}
