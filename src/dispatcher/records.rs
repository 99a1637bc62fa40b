use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tracing::info;

use super::AppContext;
use crate::cli::formatters::{
    format_comments_table, format_record_detail, format_records_json, format_records_table,
};
use crate::db::models::{Field, FieldValue, RecordKey, RecordPatch, StoredRecord};
use crate::db::{RecordStore, SqliteStore};
use crate::derived::update_field;
use crate::error::QuoteError;
use crate::export::export_csv;

pub async fn dispatch_list(ctx: &AppContext) -> Result<()> {
    let store = SqliteStore::open(&ctx.db_path)?;
    let records = store.list_all()?;

    if ctx.json_output {
        println!("{}", format_records_json(&records));
    } else {
        print!("{}", format_records_table(&records));
    }
    Ok(())
}

pub async fn dispatch_update(
    key: RecordKey,
    field: &str,
    value: String,
    ctx: &AppContext,
) -> Result<()> {
    let field: Field = field.parse()?;
    let mut store = SqliteStore::open(&ctx.db_path)?;
    let stored = store.get(key)?.ok_or(QuoteError::RecordNotFound(key))?;

    let updated = update_field(&stored.record, field, FieldValue::Text(value))?;
    let patch = RecordPatch::between(&stored.record, &updated);
    if patch.is_empty() {
        info!("Update of {} on quotation {} changed nothing", field, key);
    } else {
        store.update(key, &patch)?;
        info!("Quotation {}: {} fields changed", key, patch.changes.len());
    }

    let result = StoredRecord {
        key,
        record: updated,
    };
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", format_record_detail(&result));
    }
    Ok(())
}

pub async fn dispatch_delete(key: RecordKey, ctx: &AppContext) -> Result<()> {
    let mut store = SqliteStore::open(&ctx.db_path)?;
    store.delete(key)?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "deleted": key }));
    } else {
        println!("{} Deleted quotation {}", "✓".green().bold(), key);
    }
    Ok(())
}

pub async fn dispatch_comment_add(
    key: RecordKey,
    author: &str,
    text: &str,
    ctx: &AppContext,
) -> Result<()> {
    let store = SqliteStore::open(&ctx.db_path)?;
    store.get(key)?.ok_or(QuoteError::RecordNotFound(key))?;
    let id = store.add_comment(key, author, text)?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "id": id, "quotationKey": key }));
    } else {
        println!("{} Comment added to quotation {}", "✓".green().bold(), key);
    }
    Ok(())
}

pub async fn dispatch_comment_list(key: RecordKey, ctx: &AppContext) -> Result<()> {
    let store = SqliteStore::open(&ctx.db_path)?;
    let comments = store.list_comments(key)?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&comments)?);
    } else {
        print!("{}", format_comments_table(&comments));
    }
    Ok(())
}

pub async fn dispatch_export(path: &Path, ctx: &AppContext) -> Result<()> {
    let store = SqliteStore::open(&ctx.db_path)?;
    let records = store.list_all()?;
    let count = export_csv(&records, path)
        .with_context(|| format!("Failed to export quotations to {:?}", path))?;

    if ctx.json_output {
        println!(
            "{}",
            serde_json::json!({ "exported": count, "path": path.display().to_string() })
        );
    } else {
        println!(
            "{} Exported {} quotations to {}",
            "✓".green().bold(),
            count,
            path.display()
        );
    }
    Ok(())
}
