//! Import orchestration
//!
//! `import_sheet` runs one grid through extraction, mapping, validation and
//! duplicate resolution. `ImportSession` wraps it in the user-facing
//! lifecycle:
//!
//! ```text
//! Idle → FilesSelected → Parsing → Validated → AutoApplied ─────────┐
//!                                      └─────→ AwaitingUserDecision ┴→ Idle
//! ```
//!
//! A clean outcome (nothing invalid, nothing duplicated) is applied
//! automatically; anything else waits for the caller to apply the new
//! records or discard the run. A failed apply also waits, holding only the
//! records that were not stored, so applying again never duplicates them.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::db::models::{QuotationRecord, RecordKey};
use crate::db::RecordStore;
use crate::error::QuoteError;
use crate::importers::{
    self, extract_rows, map_row, resolve_against_store, validate, Grid, ImportMode,
    InvalidRecord, MappingContext,
};

/// Summary of one import run
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub total: usize,
    pub valid: usize,
    /// Valid records whose key is not yet stored
    pub new_items: Vec<QuotationRecord>,
    /// Valid records whose key is already stored
    pub duplicates: Vec<QuotationRecord>,
    pub duplicate_keys: Vec<String>,
    pub invalid: Vec<InvalidRecord>,
}

impl ImportOutcome {
    pub fn invalid_count(&self) -> usize {
        self.invalid.len()
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    /// True when the outcome can be applied without asking the user
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty() && self.duplicates.is_empty()
    }

    /// Drop the first `applied` new records, which are already stored
    fn without_applied(mut self, applied: usize) -> Self {
        self.new_items.drain(..applied.min(self.new_items.len()));
        self
    }

    /// Fold another file's outcome into this one
    pub fn merge(&mut self, other: ImportOutcome) {
        self.total += other.total;
        self.valid += other.valid;
        self.new_items.extend(other.new_items);
        self.duplicates.extend(other.duplicates);
        for key in other.duplicate_keys {
            if !self.duplicate_keys.contains(&key) {
                self.duplicate_keys.push(key);
            }
        }
        self.invalid.extend(other.invalid);
    }
}

/// Run one sheet grid through the whole pipeline
///
/// Structural problems abort with `MalformedSheet`; per-record problems land
/// in the outcome. The store is only read (fresh, right before the
/// duplicate check).
pub fn import_sheet<S: RecordStore + ?Sized>(
    grid: &Grid,
    mode: ImportMode,
    ctx: &MappingContext,
    store: &S,
) -> Result<ImportOutcome> {
    let raw_rows = extract_rows(grid, mode)?;
    let total = raw_rows.len();

    let mapped: Vec<QuotationRecord> = raw_rows.iter().map(|raw| map_row(raw, ctx)).collect();
    let validation = validate(mapped);
    let valid = validation.valid.len();

    let resolution = resolve_against_store(validation.valid, store)?;

    info!(
        "Import: {} rows, {} valid, {} invalid, {} duplicates",
        total,
        valid,
        validation.invalid.len(),
        resolution.duplicates.len()
    );

    Ok(ImportOutcome {
        total,
        valid,
        new_items: resolution.new_items,
        duplicates: resolution.duplicates,
        duplicate_keys: resolution.duplicate_keys,
        invalid: validation.invalid,
    })
}

/// Insert records into the store, returning their keys in order
///
/// Stops at the first persistence failure; records inserted before it stay.
pub fn apply_new_records<S: RecordStore + ?Sized>(
    store: &mut S,
    records: &[QuotationRecord],
) -> Result<Vec<RecordKey>> {
    let mut keys = Vec::with_capacity(records.len());
    insert_each(store, records, &mut keys)?;
    info!("Applied {} new quotation records", keys.len());
    Ok(keys)
}

/// Insert in order, pushing each key as soon as it is stored
///
/// On failure `keys` holds exactly the records that made it in.
fn insert_each<S: RecordStore + ?Sized>(
    store: &mut S,
    records: &[QuotationRecord],
    keys: &mut Vec<RecordKey>,
) -> Result<()> {
    for record in records {
        let key = store
            .insert(record)
            .with_context(|| format!("Failed to store quotation {}", record.referencia))?;
        keys.push(key);
    }
    Ok(())
}

/// Where an import session currently is
#[derive(Debug, Clone)]
pub enum SessionState {
    Idle,
    FilesSelected(Vec<PathBuf>),
    Parsing,
    Validated(ImportOutcome),
    AutoApplied {
        outcome: ImportOutcome,
        keys: Vec<RecordKey>,
    },
    AwaitingUserDecision(ImportOutcome),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::FilesSelected(_) => "FilesSelected",
            SessionState::Parsing => "Parsing",
            SessionState::Validated(_) => "Validated",
            SessionState::AutoApplied { .. } => "AutoApplied",
            SessionState::AwaitingUserDecision(_) => "AwaitingUserDecision",
        }
    }
}

/// One user-driven import, from file selection to applied records
#[derive(Debug)]
pub struct ImportSession {
    state: SessionState,
    mode: ImportMode,
    sheet: Option<String>,
    ctx: MappingContext,
}

impl ImportSession {
    pub fn new(mode: ImportMode, ctx: MappingContext) -> Self {
        Self {
            state: SessionState::Idle,
            mode,
            sheet: None,
            ctx,
        }
    }

    /// Read workbook files from the named worksheet instead of the first one
    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The outcome of the last run, if one is held
    pub fn outcome(&self) -> Option<&ImportOutcome> {
        match &self.state {
            SessionState::Validated(outcome)
            | SessionState::AwaitingUserDecision(outcome)
            | SessionState::AutoApplied { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    /// Idle → FilesSelected
    pub fn select_files<P: AsRef<Path>>(&mut self, files: &[P]) -> Result<()> {
        self.expect_state("select files", |s| matches!(s, SessionState::Idle))?;
        if files.is_empty() {
            warn!("No files selected");
            return Ok(());
        }
        self.state =
            SessionState::FilesSelected(files.iter().map(|p| p.as_ref().to_path_buf()).collect());
        Ok(())
    }

    /// FilesSelected → Parsing → Validated → AutoApplied | AwaitingUserDecision
    ///
    /// Every selected file is loaded and imported; outcomes are merged. With
    /// `persist` off even a clean run ends in `AwaitingUserDecision`, so
    /// previews never write.
    pub fn run<S: RecordStore + ?Sized>(&mut self, store: &mut S, persist: bool) -> Result<()> {
        let files = match &self.state {
            SessionState::FilesSelected(files) => files.clone(),
            other => {
                return Err(QuoteError::InvalidTransition {
                    from: other.name(),
                    action: "run import",
                }
                .into())
            }
        };

        self.state = SessionState::Parsing;
        let outcome = match self.parse_all(&files, &*store) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = SessionState::Idle;
                return Err(e);
            }
        };
        self.state = SessionState::Validated(outcome.clone());

        if !(persist && outcome.is_clean()) {
            self.state = SessionState::AwaitingUserDecision(outcome);
            return Ok(());
        }

        let mut keys = Vec::with_capacity(outcome.new_items.len());
        if let Err(e) = insert_each(store, &outcome.new_items, &mut keys) {
            warn!("Auto-apply stopped after {} records", keys.len());
            self.state = SessionState::AwaitingUserDecision(outcome.without_applied(keys.len()));
            return Err(e);
        }
        info!("Applied {} new quotation records", keys.len());
        self.state = SessionState::AutoApplied { outcome, keys };
        Ok(())
    }

    /// AwaitingUserDecision → Idle, inserting only the new records
    ///
    /// On a persistence failure the session keeps waiting with the records
    /// that were not stored, so the call can be retried.
    pub fn apply_pending<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<Vec<RecordKey>> {
        let outcome = match &self.state {
            SessionState::AwaitingUserDecision(outcome) => outcome.clone(),
            other => {
                return Err(QuoteError::InvalidTransition {
                    from: other.name(),
                    action: "apply pending records",
                }
                .into())
            }
        };

        let mut keys = Vec::with_capacity(outcome.new_items.len());
        if let Err(e) = insert_each(store, &outcome.new_items, &mut keys) {
            warn!("Apply stopped after {} records", keys.len());
            self.state = SessionState::AwaitingUserDecision(outcome.without_applied(keys.len()));
            return Err(e);
        }
        info!("Applied {} new quotation records", keys.len());
        self.state = SessionState::Idle;
        Ok(keys)
    }

    /// AwaitingUserDecision → Idle without writing anything
    pub fn discard(&mut self) -> Result<()> {
        self.expect_state("discard", |s| {
            matches!(s, SessionState::AwaitingUserDecision(_))
        })?;
        self.state = SessionState::Idle;
        Ok(())
    }

    /// AutoApplied → Idle, returning the inserted keys
    pub fn finish(&mut self) -> Result<Vec<RecordKey>> {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::AutoApplied { keys, .. } => Ok(keys),
            other => {
                let from = other.name();
                self.state = other;
                Err(QuoteError::InvalidTransition {
                    from,
                    action: "finish",
                }
                .into())
            }
        }
    }

    fn parse_all<S: RecordStore + ?Sized>(
        &self,
        files: &[PathBuf],
        store: &S,
    ) -> Result<ImportOutcome> {
        let mut combined = ImportOutcome::default();
        for file in files {
            let grid = importers::load_grid(file, self.sheet.as_deref())
                .with_context(|| format!("Error reading import file {:?}", file))?;
            let outcome = import_sheet(&grid, self.mode, &self.ctx, store)
                .with_context(|| format!("Error importing {:?}", file))?;
            combined.merge(outcome);
        }
        Ok(combined)
    }

    fn expect_state(
        &self,
        action: &'static str,
        allowed: impl Fn(&SessionState) -> bool,
    ) -> Result<()> {
        if allowed(&self.state) {
            Ok(())
        } else {
            Err(QuoteError::InvalidTransition {
                from: self.state.name(),
                action,
            }
            .into())
        }
    }
}
