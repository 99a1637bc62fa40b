//! Plain CSV export of stored quotations

use anyhow::{Context, Result};
use csv::Writer;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::db::models::{Field, StoredRecord};

/// Write every record to a CSV file: `key` then one column per field
pub fn export_csv(records: &[StoredRecord], path: &Path) -> Result<usize> {
    let mut wtr = Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {:?}", path))?;
    write_records(&mut wtr, records)?;
    info!("Exported {} quotations to {:?}", records.len(), path);
    Ok(records.len())
}

pub fn write_records<W: Write>(wtr: &mut Writer<W>, records: &[StoredRecord]) -> Result<()> {
    let header = std::iter::once("key").chain(Field::ALL.iter().map(|f| f.as_str()));
    wtr.write_record(header).context("Failed to write CSV header")?;

    for stored in records {
        let row = std::iter::once(stored.key.to_string()).chain(
            Field::ALL
                .iter()
                .map(|field| stored.record.get(*field).into_text()),
        );
        wtr.write_record(row)
            .with_context(|| format!("Failed to write quotation {}", stored.key))?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}
