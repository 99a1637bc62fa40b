// Import module - quotation sheet adapters and ingestion pipeline

pub mod csv_sheet;
pub mod duplicates;
pub mod excel_sheet;
pub mod header;
pub mod mapping;
pub mod normalizer;
pub mod validation;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

use crate::error::QuoteError;

pub use duplicates::{resolve, resolve_against_store, DuplicateResolution};
pub use header::{extract_rows, RawRow};
pub use mapping::{map_row, MappingContext, UNKNOWN_REFERENCE};
pub use normalizer::normalize_field;
pub use validation::{validate, InvalidRecord, ValidationIssue, ValidationResult};

/// A single untyped cell of a sheet grid
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(Decimal),
}

impl Cell {
    /// Build a cell from text, treating whitespace-only input as empty
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Text rendering of the cell ("" for empty cells)
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.normalize().to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// A sheet as rows of cells, row 0 being the first visible row
pub type Grid = Vec<Vec<Cell>>;

/// Header-row convention chosen by the user at import time
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum ImportMode {
    /// Title row, blank row, header row, data rows
    #[default]
    #[serde(rename = "standard")]
    #[value(name = "standard")]
    Standard,
    /// Title row, header row, data rows
    #[serde(rename = "header-at-row2", alias = "headerAtRow2")]
    #[value(name = "header-at-row2", alias = "headerAtRow2")]
    HeaderAtRow2,
}

impl ImportMode {
    /// Zero-based index of the header row
    pub fn header_index(self) -> usize {
        match self {
            ImportMode::Standard => 2,
            ImportMode::HeaderAtRow2 => 1,
        }
    }

    /// Minimum number of grid rows the mode needs (up to and including the header)
    pub fn min_rows(self) -> usize {
        self.header_index() + 1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImportMode::Standard => "standard",
            ImportMode::HeaderAtRow2 => "header-at-row2",
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load a sheet grid from a CSV or workbook file (dispatch by extension)
///
/// `sheet` selects a worksheet by name for workbook files; CSV files ignore it.
pub fn load_grid<P: AsRef<Path>>(file_path: P, sheet: Option<&str>) -> Result<Grid> {
    let path = file_path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    info!("Loading sheet: {:?} (type: {})", path, extension);

    match extension.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => excel_sheet::read_workbook_grid(path, sheet),
        "csv" | "txt" => csv_sheet::read_csv_grid(path),
        "" => Err(QuoteError::UnsupportedFormat("file has no extension".to_string()).into()),
        other => Err(QuoteError::UnsupportedFormat(format!(
            "{}. Supported formats: .xlsx, .xls, .ods, .csv",
            other
        ))
        .into()),
    }
}
