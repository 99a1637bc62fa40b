use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use crate::cli::formatters::format_inspect_table;
use crate::importers::excel_sheet::sheet_names;
use crate::importers::header::header_columns;
use crate::importers::mapping::resolve_headers;
use crate::importers::{extract_rows, load_grid, ImportMode};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonHeader {
    header: String,
    normalized: String,
    target: Option<String>,
}

pub async fn dispatch_inspect(
    file: &Path,
    mode: ImportMode,
    sheet: Option<&str>,
    json_output: bool,
) -> Result<()> {
    tracing::info!("Inspecting {:?} in {} mode", file, mode);

    let grid = load_grid(file, sheet)?;
    let headers = header_columns(&grid, mode)?;
    let data_rows = extract_rows(&grid, mode)?.len();
    let resolved = resolve_headers(headers.iter().map(|(_, h)| h.as_str()));
    // CSV files have no worksheets
    let sheets = sheet_names(file).unwrap_or_default();

    if json_output {
        let headers: Vec<JsonHeader> = resolved
            .iter()
            .map(|(header, normalized, target)| JsonHeader {
                header: header.clone(),
                normalized: normalized.clone(),
                target: target.map(|f| f.to_string()),
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "mode": mode.as_str(),
                "headerRow": mode.header_index() + 1,
                "dataRows": data_rows,
                "sheets": sheets,
                "headers": headers,
            }))?
        );
        return Ok(());
    }

    println!(
        "\n{} {} ({} mode): header on row {}, {} data rows\n",
        "ℹ".blue().bold(),
        file.display(),
        mode,
        mode.header_index() + 1,
        data_rows
    );
    if sheets.len() > 1 {
        println!("Worksheets: {}\n", sheets.join(", "));
    }
    print!("{}", format_inspect_table(&resolved));
    Ok(())
}
