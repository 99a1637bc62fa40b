use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::info;

use super::AppContext;
use crate::cli::formatters::{format_import_json, format_import_summary, ImportStatus};
use crate::db::models::parse_date;
use crate::db::{MemoryStore, RecordStore, SqliteStore};
use crate::importers::{ImportMode, MappingContext};
use crate::session::{ImportSession, SessionState};

/// Options of the `import` command
#[derive(Debug, Clone, Default)]
pub struct ImportArgs {
    pub files: Vec<PathBuf>,
    pub mode: Option<ImportMode>,
    pub shop: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub date: Option<String>,
    pub segment: Option<String>,
    pub sheet: Option<String>,
    pub dry_run: bool,
    pub apply_new: bool,
}

pub async fn dispatch_import(args: ImportArgs, ctx: &AppContext) -> Result<()> {
    let defaults = &ctx.config.import;
    let mode = args.mode.or(defaults.mode).unwrap_or_default();

    let quotation_date = match args.date.as_deref() {
        Some(text) => Some(parse_date(text).ok_or_else(|| {
            anyhow!("Invalid date '{}': expected YYYY-MM-DD or DD/MM/YYYY", text)
        })?),
        None => None,
    };

    let mapping = MappingContext {
        shop_no: pick(args.shop, &defaults.shop_no),
        contact_name: pick(args.contact_name, &defaults.contact_name),
        contact_phone: pick(args.contact_phone, &defaults.contact_phone),
        quotation_date,
        segment: pick(args.segment, &defaults.segment),
    };

    info!(
        "Importing {} file(s) in {} mode (dry run: {})",
        args.files.len(),
        mode,
        args.dry_run
    );

    let mut store = open_store(ctx, args.dry_run)?;
    let mut session = ImportSession::new(mode, mapping).with_sheet(args.sheet);
    session.select_files(&args.files)?;
    session.run(store.as_mut(), !args.dry_run)?;

    let outcome = session
        .outcome()
        .cloned()
        .ok_or_else(|| anyhow!("Import finished without an outcome"))?;

    let auto_applied = matches!(session.state(), SessionState::AutoApplied { .. });
    let status = if auto_applied {
        ImportStatus::Applied(session.finish()?)
    } else if args.dry_run {
        session.discard()?;
        ImportStatus::Preview
    } else if args.apply_new {
        ImportStatus::Applied(session.apply_pending(store.as_mut())?)
    } else {
        session.discard()?;
        ImportStatus::Pending
    };

    if ctx.json_output {
        println!("{}", format_import_json(&outcome, &status));
    } else {
        print!("{}", format_import_summary(&outcome, &status));
    }

    Ok(())
}

/// Dry runs read the existing database if there is one and never create it
fn open_store(ctx: &AppContext, dry_run: bool) -> Result<Box<dyn RecordStore>> {
    if !dry_run {
        return Ok(Box::new(SqliteStore::open(&ctx.db_path)?));
    }
    if ctx.db_path.exists() {
        Ok(Box::new(SqliteStore::open_read_only(&ctx.db_path)?))
    } else {
        info!("No database at {:?}, previewing against an empty store", ctx.db_path);
        Ok(Box::new(MemoryStore::read_only(Vec::new())))
    }
}

fn pick(cli: Option<String>, default: &Option<String>) -> String {
    cli.or_else(|| default.clone()).unwrap_or_default()
}
