use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use super::{Cell, Grid};

/// Names of the worksheets in a workbook, in workbook order
pub fn sheet_names<P: AsRef<Path>>(file_path: P) -> Result<Vec<String>> {
    let path = file_path.as_ref();
    let workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {:?}", path))?;
    Ok(workbook.sheet_names().to_vec())
}

/// Read one worksheet of a workbook into a grid
///
/// Uses the named sheet when given, the first sheet otherwise. Rows and
/// columns are anchored at A1 even when the used range starts further in.
pub fn read_workbook_grid<P: AsRef<Path>>(file_path: P, sheet: Option<&str>) -> Result<Grid> {
    let path = file_path.as_ref();
    info!("Parsing workbook: {:?}", path);

    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {:?}", path))?;

    let names = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|name| name.as_str() == wanted)
            .cloned()
            .ok_or_else(|| {
                anyhow!(
                    "Worksheet '{}' not found. Available: {}",
                    wanted,
                    names.join(", ")
                )
            })?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("Workbook has no worksheets"))?,
    };

    debug!("Reading worksheet: {}", sheet_name);
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read worksheet '{}'", sheet_name))?;

    let grid = range_to_grid(&range);
    info!("Read {} rows from worksheet '{}'", grid.len(), sheet_name);
    Ok(grid)
}

fn range_to_grid(range: &Range<Data>) -> Grid {
    let (first_row, first_col) = range.start().unwrap_or((0, 0));

    let mut grid: Grid = vec![Vec::new(); first_row as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; first_col as usize];
        cells.extend(row.iter().map(convert_cell));
        grid.push(cells);
    }
    grid
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::String(s) => Cell::text(s.as_str()),
        Data::Int(i) => Cell::Number(Decimal::from(*i)),
        Data::Float(f) => float_cell(*f),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => {
            let days = dt.as_f64().floor() as i64;
            match excel_date(days) {
                Some(date) => Cell::Text(date.format("%Y-%m-%d").to_string()),
                None => float_cell(dt.as_f64()),
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s.as_str()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

/// Floats go through their shortest text form so 2.5 stays 2.5
fn float_cell(f: f64) -> Cell {
    Decimal::from_str(&f.to_string())
        .ok()
        .or_else(|| Decimal::from_f64_retain(f))
        .map(Cell::Number)
        .unwrap_or_else(|| Cell::Text(f.to_string()))
}

fn excel_date(days_since_epoch: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .checked_add_signed(chrono::Duration::days(days_since_epoch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn test_float_cells_keep_short_form() {
        assert_eq!(float_cell(2.5), Cell::Number(dec!(2.5)));
        assert_eq!(float_cell(0.1), Cell::Number(dec!(0.1)));
        assert_eq!(float_cell(10.0), Cell::Number(dec!(10)));
    }

    #[test]
    fn test_excel_date_epoch() {
        assert_eq!(excel_date(45000), NaiveDate::from_ymd_opt(2023, 3, 15));
    }

    #[test]
    fn test_workbook_grid_keeps_blank_row_and_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quotes.xlsx");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Quotes").unwrap();
        worksheet.write_string(0, 0, "Q1 quotes").unwrap();
        worksheet.write_string(2, 0, "REF").unwrap();
        worksheet.write_string(2, 1, "U.PRICE").unwrap();
        worksheet.write_string(3, 0, "A1").unwrap();
        worksheet.write_number(3, 1, 2.5).unwrap();
        workbook.save(&path).unwrap();

        let grid = read_workbook_grid(&path, None).unwrap();
        assert_eq!(grid.len(), 4);
        assert!(grid[1].iter().all(Cell::is_empty));
        assert_eq!(grid[2][0], Cell::Text("REF".to_string()));
        assert_eq!(grid[3][1], Cell::Number(dec!(2.5)));

        assert_eq!(sheet_names(&path).unwrap(), vec!["Quotes".to_string()]);
    }

    #[test]
    fn test_range_not_starting_at_a1_is_padded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(1, 1, "REF").unwrap();
        worksheet.write_string(2, 1, "A1").unwrap();
        workbook.save(&path).unwrap();

        let grid = read_workbook_grid(&path, None).unwrap();
        assert_eq!(grid.len(), 3);
        assert!(grid[0].is_empty());
        assert_eq!(grid[1][0], Cell::Empty);
        assert_eq!(grid[1][1], Cell::Text("REF".to_string()));
    }

    #[test]
    fn test_missing_sheet_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.xlsx");

        let mut workbook = Workbook::new();
        workbook.add_worksheet().write_string(0, 0, "x").unwrap();
        workbook.save(&path).unwrap();

        let err = read_workbook_grid(&path, Some("Nope")).unwrap_err();
        assert!(err.to_string().contains("Nope"));
    }
}
