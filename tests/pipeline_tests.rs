//! Integration tests for the import pipeline against a file-backed SQLite store

use quotedesk::db::{RecordStore, SqliteStore};
use quotedesk::importers::{load_grid, normalize_field, Cell, ImportMode, MappingContext};
use quotedesk::session::{apply_new_records, import_sheet, ImportSession, SessionState};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use rust_xlsxwriter::Workbook;
use std::path::PathBuf;
use tempfile::TempDir;

const SCENARIO_CSV: &str = "Q1 quotes\n\nREF,DESCRIPTION,NAME,CTNS,UNIT/CTN,U.PRICE,L,W,H\nA1,Widget,WidgetName,5,10,2.50,10,10,10\n";

fn shop_s1() -> MappingContext {
    MappingContext {
        shop_no: "S1".to_string(),
        ..Default::default()
    }
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("failed to write fixture");
    path
}

fn open_store(dir: &TempDir) -> SqliteStore {
    SqliteStore::open(&dir.path().join("db").join("data.db")).expect("failed to open store")
}

#[test]
fn test_standard_csv_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "q1.csv", SCENARIO_CSV);
    let store = open_store(&dir);

    let grid = load_grid(&path, None).unwrap();
    let outcome = import_sheet(&grid, ImportMode::Standard, &shop_s1(), &store).unwrap();

    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.invalid_count(), 0);
    assert_eq!(outcome.new_items.len(), 1);
    assert!(outcome.duplicates.is_empty());

    let record = &outcome.new_items[0];
    assert_eq!(record.referencia, "A1");
    assert_eq!(record.shop_no, "S1");
    assert_eq!(record.ctns, dec!(5));
    assert_eq!(record.unit_ctn, dec!(10));
    assert_eq!(record.unit_price_rmb, dec!(2.5));
    assert_eq!(record.cbm, dec!(0.001));
    assert_eq!(record.qty, dec!(50));
    assert_eq!(record.amount, dec!(125));
    assert!(record.quotation_no.starts_with("Q-"));
}

#[test]
fn test_reimport_against_sqlite_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "q1.csv", SCENARIO_CSV);
    let mut store = open_store(&dir);
    let grid = load_grid(&path, None).unwrap();

    let first = import_sheet(&grid, ImportMode::Standard, &shop_s1(), &store).unwrap();
    let keys = apply_new_records(&mut store, &first.new_items).unwrap();
    assert_eq!(keys.len(), 1);

    let second = import_sheet(&grid, ImportMode::Standard, &shop_s1(), &store).unwrap();
    assert_eq!(second.duplicates.len(), 1);
    assert!(second.new_items.is_empty());
    assert_eq!(store.list_all().unwrap().len(), 1);

    let stored = store.get(keys[0]).unwrap().unwrap();
    assert_eq!(stored.record, first.new_items[0]);
}

#[test]
fn test_session_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "q1.csv", SCENARIO_CSV);

    {
        let mut store = open_store(&dir);
        let mut session = ImportSession::new(ImportMode::Standard, shop_s1());
        session.select_files(&[&path]).unwrap();
        session.run(&mut store, true).unwrap();
        assert!(matches!(session.state(), SessionState::AutoApplied { .. }));
        session.finish().unwrap();
    }

    let store = open_store(&dir);
    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].record.referencia, "A1");
}

#[test]
fn test_workbook_and_csv_produce_same_records() {
    let dir = TempDir::new().unwrap();
    let csv_path = write_file(&dir, "q1.csv", SCENARIO_CSV);

    let xlsx_path = dir.path().join("q1.xlsx");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "Q1 quotes").unwrap();
    let headers = ["REF", "DESCRIPTION", "NAME", "CTNS", "UNIT/CTN", "U.PRICE", "L", "W", "H"];
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(2, col as u16, *header).unwrap();
    }
    worksheet.write_string(3, 0, "A1").unwrap();
    worksheet.write_string(3, 1, "Widget").unwrap();
    worksheet.write_string(3, 2, "WidgetName").unwrap();
    for (col, value) in [5.0, 10.0, 2.5, 10.0, 10.0, 10.0].iter().enumerate() {
        worksheet.write_number(3, (col + 3) as u16, *value).unwrap();
    }
    workbook.save(&xlsx_path).unwrap();

    let store = open_store(&dir);
    let from_csv = import_sheet(
        &load_grid(&csv_path, None).unwrap(),
        ImportMode::Standard,
        &shop_s1(),
        &store,
    )
    .unwrap();
    let from_xlsx = import_sheet(
        &load_grid(&xlsx_path, None).unwrap(),
        ImportMode::Standard,
        &shop_s1(),
        &store,
    )
    .unwrap();

    assert_eq!(from_csv.new_items, from_xlsx.new_items);
}

#[test]
fn test_header_at_row2_with_tolerant_headers() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "shop.csv",
        "Shop 12 - spring list\nref, description ,Name,ctns,unit/ctn,u price,G.W,UNIT WEIGHT (G)\nB7,Kettle,Kettle,4,6,38,9.5,800\n\n",
    );
    let store = open_store(&dir);

    let grid = load_grid(&path, None).unwrap();
    let outcome = import_sheet(&grid, ImportMode::HeaderAtRow2, &shop_s1(), &store).unwrap();
    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.valid, 1);

    let record = &outcome.new_items[0];
    assert_eq!(record.referencia, "B7");
    assert_eq!(record.unit_price_rmb, dec!(38));
    assert_eq!(record.qty, dec!(24));
    assert_eq!(record.total_gw, dec!(38));
    assert_eq!(record.nw, dec!(4.8));
    assert_eq!(record.total_nw, dec!(19.2));
}

#[test]
fn test_header_variants_normalize_identically() {
    let canonical = normalize_field("U.PRICE");
    assert_eq!(canonical, "U_PRICE");
    assert_eq!(normalize_field("u price"), canonical);
    assert_eq!(normalize_field(" U PRICE "), canonical);
}

#[test]
fn test_invalid_and_missing_rows_are_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "mixed.csv",
        "title\n\nREF,DESCRIPTION,NAME,CTNS,UNIT/CTN,U.PRICE\nA1,Cup,Cup,2,6,3\n,Plate,Plate,1,1,1\nA3,Bowl,,1,1,1\nA4,Jar,Jar,-1,1,1\n",
    );
    let store = open_store(&dir);

    let grid = load_grid(&path, None).unwrap();
    let outcome = import_sheet(&grid, ImportMode::Standard, &shop_s1(), &store).unwrap();

    assert_eq!(outcome.total, 4);
    assert_eq!(outcome.valid, 2);
    assert_eq!(outcome.invalid_count(), 2);
    assert!(outcome
        .invalid
        .iter()
        .all(|invalid| !invalid.issues.is_empty()));

    // A missing reference becomes the UNKNOWN sentinel and still validates
    let keys: Vec<&str> = outcome.new_items.iter().map(|r| r.natural_key()).collect();
    assert_eq!(keys, vec!["A1", "UNKNOWN"]);
}

#[test]
fn test_missing_numeric_columns_default_to_zero() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "sparse.csv", "t\nREF,DESCRIPTION,NAME\nC1,Lamp,Lamp\n");
    let store = open_store(&dir);

    let grid = load_grid(&path, None).unwrap();
    let outcome = import_sheet(&grid, ImportMode::HeaderAtRow2, &shop_s1(), &store).unwrap();
    let record = &outcome.new_items[0];
    assert_eq!(record.ctns, Decimal::ZERO);
    assert_eq!(record.unit_price_rmb, Decimal::ZERO);
    assert_eq!(record.amount, Decimal::ZERO);
}

#[test]
fn test_short_sheet_is_malformed() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "short.csv", "title\nREF,NAME\n");
    let store = open_store(&dir);

    let grid = load_grid(&path, None).unwrap();
    assert_eq!(grid.len(), 2);
    assert!(import_sheet(&grid, ImportMode::Standard, &shop_s1(), &store).is_err());

    let outcome = import_sheet(&grid, ImportMode::HeaderAtRow2, &shop_s1(), &store).unwrap();
    assert_eq!(outcome.total, 0);
    assert!(outcome.is_clean());
}

#[test]
fn test_grid_cells_from_csv_are_text() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "q1.csv", SCENARIO_CSV);
    let grid = load_grid(&path, None).unwrap();
    assert_eq!(grid[3][3], Cell::Text("5".to_string()));
}

#[test]
fn test_multiline_title_and_spaced_separator_keep_header_row() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "q2.csv",
        "\"Q2 quotes\nshop 12\"\n   \nREF,DESCRIPTION,NAME,CTNS\nD4,Tray,Tray,3\n",
    );
    let store = open_store(&dir);

    let grid = load_grid(&path, None).unwrap();
    assert_eq!(grid.len(), 4);
    let outcome = import_sheet(&grid, ImportMode::Standard, &shop_s1(), &store).unwrap();
    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.new_items[0].referencia, "D4");
    assert_eq!(outcome.new_items[0].ctns, dec!(3));
}
