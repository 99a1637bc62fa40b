//! Output formatting module for CLI display
//!
//! Handlers compute; these functions only render tables, summaries and JSON.

use colored::Colorize;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::db::models::{Comment, Field, RecordKey, StoredRecord};
use crate::session::ImportOutcome;
use crate::utils::{format_quantity, format_rmb};

/// What happened to an import after parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatus {
    /// New records were written
    Applied(Vec<RecordKey>),
    /// Issues found; nothing written
    Pending,
    /// Dry run; nothing written
    Preview,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonIssue {
    row: usize,
    field: String,
    value: String,
    reason: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonImport {
    status: &'static str,
    total: usize,
    valid: usize,
    invalid: usize,
    duplicates: usize,
    new_items: usize,
    duplicate_keys: Vec<String>,
    applied_keys: Vec<RecordKey>,
    issues: Vec<JsonIssue>,
}

pub fn format_import_json(outcome: &ImportOutcome, status: &ImportStatus) -> String {
    let (status_name, applied_keys) = match status {
        ImportStatus::Applied(keys) => ("applied", keys.clone()),
        ImportStatus::Pending => ("pending", Vec::new()),
        ImportStatus::Preview => ("preview", Vec::new()),
    };

    let issues = outcome
        .invalid
        .iter()
        .flat_map(|invalid| invalid.issues.iter())
        .map(|issue| JsonIssue {
            row: issue.row,
            field: issue.field.to_string(),
            value: issue.value.clone(),
            reason: issue.reason.clone(),
        })
        .collect();

    let report = JsonImport {
        status: status_name,
        total: outcome.total,
        valid: outcome.valid,
        invalid: outcome.invalid_count(),
        duplicates: outcome.duplicate_count(),
        new_items: outcome.new_items.len(),
        duplicate_keys: outcome.duplicate_keys.clone(),
        applied_keys,
        issues,
    };

    serde_json::to_string_pretty(&report)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Counts, the invalid-row table, duplicate keys and what was stored
pub fn format_import_summary(outcome: &ImportOutcome, status: &ImportStatus) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} Parsed {} rows: {} valid, {} invalid, {} duplicates\n",
        "✓".green().bold(),
        outcome.total,
        outcome.valid.to_string().green(),
        outcome.invalid_count().to_string().red(),
        outcome.duplicate_count().to_string().yellow()
    ));

    if !outcome.invalid.is_empty() {
        #[derive(Tabled)]
        struct IssueRow {
            #[tabled(rename = "Row")]
            row: usize,
            #[tabled(rename = "Reference")]
            reference: String,
            #[tabled(rename = "Field")]
            field: String,
            #[tabled(rename = "Value")]
            value: String,
            #[tabled(rename = "Reason")]
            reason: String,
        }

        let rows: Vec<IssueRow> = outcome
            .invalid
            .iter()
            .flat_map(|invalid| {
                invalid.issues.iter().map(|issue| IssueRow {
                    row: issue.row,
                    reference: invalid.record.referencia.clone(),
                    field: issue.field.to_string(),
                    value: issue.value.clone(),
                    reason: issue.reason.clone(),
                })
            })
            .collect();

        output.push_str(&format!("\n{} Invalid rows\n", "✗".red().bold()));
        output.push_str(&Table::new(rows).with(Style::rounded()).to_string());
        output.push('\n');
    }

    if !outcome.duplicate_keys.is_empty() {
        output.push_str(&format!(
            "\n{} Already stored: {}\n",
            "ℹ".blue().bold(),
            outcome.duplicate_keys.join(", ")
        ));
    }

    match status {
        ImportStatus::Applied(keys) => output.push_str(&format!(
            "\n{} Stored {} new quotations\n",
            "✓".green().bold(),
            keys.len()
        )),
        ImportStatus::Preview => {
            output.push_str(&format!("\n{} Dry run - no changes saved\n", "ℹ".blue().bold()))
        }
        ImportStatus::Pending => output.push_str(&format!(
            "\n{} Nothing stored. Re-run with --apply-new to store the {} new quotations\n",
            "⚠".yellow().bold(),
            outcome.new_items.len()
        )),
    }

    output
}

/// Stored quotations as a table
pub fn format_records_table(records: &[StoredRecord]) -> String {
    if records.is_empty() {
        return format!("\n{} No quotations stored\n", "ℹ".blue().bold());
    }

    #[derive(Tabled)]
    struct RecordRow {
        #[tabled(rename = "Key")]
        key: RecordKey,
        #[tabled(rename = "Reference")]
        referencia: String,
        #[tabled(rename = "Shop")]
        shop_no: String,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "CTNS")]
        ctns: String,
        #[tabled(rename = "Qty")]
        qty: String,
        #[tabled(rename = "Unit Price")]
        unit_price: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Total CBM")]
        total_cbm: String,
        #[tabled(rename = "Total GW")]
        total_gw: String,
    }

    let rows: Vec<RecordRow> = records
        .iter()
        .map(|s| RecordRow {
            key: s.key,
            referencia: s.record.referencia.clone(),
            shop_no: s.record.shop_no.clone(),
            description: s.record.description.clone(),
            ctns: format_quantity(s.record.ctns),
            qty: format_quantity(s.record.qty),
            unit_price: format_rmb(s.record.unit_price_rmb),
            amount: format_rmb(s.record.amount),
            total_cbm: format_quantity(s.record.total_cbm),
            total_gw: format_quantity(s.record.total_gw),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(4..), Alignment::right());
    format!("{}\n{} quotations\n", table, records.len())
}

pub fn format_records_json(records: &[StoredRecord]) -> String {
    serde_json::to_string_pretty(records)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// One record, field by field
pub fn format_record_detail(stored: &StoredRecord) -> String {
    #[derive(Tabled)]
    struct FieldRow {
        #[tabled(rename = "Field")]
        field: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows: Vec<FieldRow> = Field::ALL
        .iter()
        .map(|field| {
            let value = stored.record.get(*field).into_text();
            FieldRow {
                field: if field.is_derived() {
                    format!("{} (derived)", field)
                } else {
                    field.to_string()
                },
                value,
            }
        })
        .collect();

    format!(
        "\n{} Quotation {}\n{}\n",
        "✓".green().bold(),
        stored.key,
        Table::new(rows).with(Style::rounded())
    )
}

pub fn format_comments_table(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return format!("{} No comments\n", "ℹ".blue().bold());
    }

    #[derive(Tabled)]
    struct CommentRow {
        #[tabled(rename = "When")]
        when: String,
        #[tabled(rename = "Author")]
        author: String,
        #[tabled(rename = "Comment")]
        body: String,
    }

    let rows: Vec<CommentRow> = comments
        .iter()
        .map(|c| CommentRow {
            when: c.created_at.format("%Y-%m-%d %H:%M").to_string(),
            author: c.author.clone(),
            body: c.body.clone(),
        })
        .collect();

    format!("{}\n", Table::new(rows).with(Style::rounded()))
}

/// Header mapping report for `inspect`
pub fn format_inspect_table(headers: &[(String, String, Option<Field>)]) -> String {
    #[derive(Tabled)]
    struct HeaderRow {
        #[tabled(rename = "Header")]
        header: String,
        #[tabled(rename = "Normalized")]
        normalized: String,
        #[tabled(rename = "Maps to")]
        target: String,
    }

    let rows: Vec<HeaderRow> = headers
        .iter()
        .map(|(header, normalized, target)| HeaderRow {
            header: header.clone(),
            normalized: normalized.clone(),
            target: match target {
                Some(field) => field.to_string().green().to_string(),
                None => "(ignored)".bright_black().to_string(),
            },
        })
        .collect();

    format!("{}\n", Table::new(rows).with(Style::rounded()))
}
