//! Header row detection and raw row assembly
//!
//! Picks the header row according to the import mode and zips it with every
//! following data row, producing string-keyed raw rows that keep the sheet's
//! column order.

use anyhow::Result;
use tracing::{debug, info};

use super::{Cell, Grid, ImportMode};
use crate::error::QuoteError;

/// One data row keyed by raw header text, in sheet column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<(String, Cell)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: impl Into<String>, value: Cell) {
        self.cells.push((header.into(), value));
    }

    /// Value under an exact header; the first column wins on repeated headers
    pub fn get(&self, header: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(key, _)| key == header)
            .map(|(_, value)| value)
    }

    /// Entries in insertion (column) order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when every value in the row is empty
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, value)| value.is_empty())
    }
}

impl<K: Into<String>> FromIterator<(K, Cell)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, Cell)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Header texts of the grid for the given mode, with their column indexes
///
/// Header cells that are empty after trimming are skipped.
pub fn header_columns(grid: &Grid, mode: ImportMode) -> Result<Vec<(usize, String)>> {
    check_rows(grid, mode)?;
    let header_row = &grid[mode.header_index()];

    Ok(header_row
        .iter()
        .enumerate()
        .filter(|(_, cell)| !cell.is_empty())
        .map(|(idx, cell)| (idx, cell.as_text()))
        .collect())
}

/// Convert every row after the header into a `RawRow`
///
/// Fails with `MalformedSheet` when the grid is shorter than the mode needs.
/// Rows whose cells are all empty are skipped.
pub fn extract_rows(grid: &Grid, mode: ImportMode) -> Result<Vec<RawRow>> {
    let headers = header_columns(grid, mode)?;
    debug!("Header columns ({}): {:?}", mode, headers);

    let mut rows = Vec::new();
    for (offset, data_row) in grid.iter().skip(mode.header_index() + 1).enumerate() {
        let raw: RawRow = headers
            .iter()
            .map(|(idx, header)| {
                let value = data_row.get(*idx).cloned().unwrap_or_default();
                (header.clone(), value)
            })
            .collect();

        if raw.is_blank() {
            debug!("Skipping blank data row {}", offset + 1);
            continue;
        }
        rows.push(raw);
    }

    info!(
        "Extracted {} data rows with {} columns ({} mode)",
        rows.len(),
        headers.len(),
        mode
    );
    Ok(rows)
}

fn check_rows(grid: &Grid, mode: ImportMode) -> Result<()> {
    if grid.len() < mode.min_rows() {
        return Err(QuoteError::MalformedSheet {
            mode,
            required: mode.min_rows(),
            found: grid.len(),
        }
        .into());
    }
    Ok(())
}
